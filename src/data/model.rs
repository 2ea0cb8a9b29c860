use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// FieldValue – a single cell of the table
// ---------------------------------------------------------------------------

/// One measurement of one sounding.  Missing values are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Decoded identifier or any other column that is not numeric.
    Text(String),
    /// Scalar measurement (rank ≤ 1 source variables).
    Float(f64),
    /// Profile measurement (rank ≥ 2 source variables, first slice).
    Array(Vec<f64>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// View the value as numbers; a scalar is a one-element slice.
    pub fn as_slice(&self) -> Option<&[f64]> {
        match self {
            FieldValue::Float(v) => Some(std::slice::from_ref(v)),
            FieldValue::Array(a) => Some(a),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            FieldValue::Text(_) => ColumnKind::Text,
            FieldValue::Float(_) => ColumnKind::Float,
            FieldValue::Array(_) => ColumnKind::Array,
        }
    }

    /// Element-wise equality treating `NaN == NaN` and allowing a relative
    /// tolerance on numbers.
    pub fn approx_eq(&self, other: &FieldValue, rel_tol: f64) -> bool {
        fn close(a: f64, b: f64, rel_tol: f64) -> bool {
            (a.is_nan() && b.is_nan())
                || a == b
                || (a - b).abs() <= rel_tol * a.abs().max(b.abs())
        }
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            (FieldValue::Float(a), FieldValue::Float(b)) => close(*a, *b, rel_tol),
            (FieldValue::Array(a), FieldValue::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| close(*x, *y, rel_tol))
            }
            _ => false,
        }
    }
}

/// Storage kind of a column, decided by its first value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Float,
    Array,
}

// ---------------------------------------------------------------------------
// Record – one row of the table
// ---------------------------------------------------------------------------

/// One sounding: the values of the configured variables, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub values: Vec<FieldValue>,
}

impl Record {
    pub fn new(values: Vec<FieldValue>) -> Self {
        Self { values }
    }
}

// ---------------------------------------------------------------------------
// Table – ordered records sharing one schema
// ---------------------------------------------------------------------------

/// Ordered sequence of records.  Every record has one value per column.
/// Identifiers are not required to be unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Table {
    /// An empty table with the given schema.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    /// All values of one column, in record order.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &FieldValue> + '_> {
        let idx = self.column_index(name)?;
        Ok(self.records.iter().map(move |r| &r.values[idx]))
    }

    /// Kind of a column, taken from its first record.  `None` when empty.
    pub fn column_kind(&self, idx: usize) -> Option<ColumnKind> {
        self.records.first().map(|r| r.values[idx].kind())
    }

    /// Append a record, rejecting one whose width differs from the schema.
    pub fn push(&mut self, record: Record) -> Result<()> {
        if record.values.len() != self.columns.len() {
            return Err(Error::SchemaMismatch {
                expected: self.columns.len(),
                found: record.values.len(),
            });
        }
        self.records.push(record);
        Ok(())
    }

    /// Append a derived column to every record at once.
    pub fn append_column(&mut self, name: &str, values: Vec<FieldValue>) -> Result<()> {
        if self.columns.iter().any(|c| c == name) {
            return Err(Error::DuplicateColumn(name.to_string()));
        }
        if values.len() != self.records.len() {
            return Err(Error::LengthMismatch {
                column: name.to_string(),
                expected: self.records.len(),
                found: values.len(),
            });
        }
        self.columns.push(name.to_string());
        for (record, value) in self.records.iter_mut().zip(values) {
            record.values.push(value);
        }
        Ok(())
    }

    /// A new table holding the records at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            records: indices
                .iter()
                .filter_map(|&i| self.records.get(i).cloned())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_row_table() -> Table {
        let mut table = Table::new(vec!["occ_id".into(), "lat".into(), "bangle".into()]);
        table
            .push(Record::new(vec![
                FieldValue::Text("A".into()),
                FieldValue::Float(10.0),
                FieldValue::Array(vec![1.0, 2.0]),
            ]))
            .unwrap();
        table
            .push(Record::new(vec![
                FieldValue::Text("B".into()),
                FieldValue::Float(-5.0),
                FieldValue::Array(vec![3.0]),
            ]))
            .unwrap();
        table
    }

    #[test]
    fn push_rejects_wrong_width() {
        let mut table = Table::new(vec!["occ_id".into(), "lat".into()]);
        let err = table
            .push(Record::new(vec![FieldValue::Text("A".into())]))
            .unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { expected: 2, found: 1 }));
        assert!(table.is_empty());
    }

    #[test]
    fn append_column_adds_exactly_one_column() {
        let mut table = two_row_table();
        let before = table.clone();
        table
            .append_column("slope", vec![FieldValue::Float(0.5), FieldValue::Float(f64::NAN)])
            .unwrap();

        assert_eq!(table.columns().len(), before.columns().len() + 1);
        assert_eq!(table.len(), before.len());
        for (new, old) in table.records().iter().zip(before.records()) {
            assert_eq!(&new.values[..3], &old.values[..]);
        }
    }

    #[test]
    fn append_column_rejects_duplicates_and_wrong_length() {
        let mut table = two_row_table();
        assert!(matches!(
            table.append_column("lat", vec![FieldValue::Float(0.0); 2]),
            Err(Error::DuplicateColumn(_))
        ));
        assert!(matches!(
            table.append_column("slope", vec![FieldValue::Float(0.0)]),
            Err(Error::LengthMismatch { expected: 2, found: 1, .. })
        ));
        assert_eq!(table.columns().len(), 3);
    }

    #[test]
    fn select_keeps_schema() {
        let table = two_row_table();
        let subset = table.select(&[1]);
        assert_eq!(subset.columns(), table.columns());
        assert_eq!(subset.len(), 1);
        assert_eq!(subset.records()[0].values[0], FieldValue::Text("B".into()));
    }

    #[test]
    fn approx_eq_treats_nan_as_equal() {
        let a = FieldValue::Array(vec![1.0, f64::NAN]);
        let b = FieldValue::Array(vec![1.0 + 1e-15, f64::NAN]);
        assert!(a.approx_eq(&b, 1e-12));
        assert!(!a.approx_eq(&FieldValue::Array(vec![1.0]), 1e-12));
    }
}
