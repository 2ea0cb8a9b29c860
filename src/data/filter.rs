use std::collections::BTreeSet;

use super::model::Table;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Row selection by text value
// ---------------------------------------------------------------------------

/// Return indices of records whose text cell in `column` is one of
/// `accepted`.
///
/// * An empty `accepted` set selects nothing.
/// * Non-text cells never match.
pub fn filtered_indices(
    table: &Table,
    column: &str,
    accepted: &BTreeSet<String>,
) -> Result<Vec<usize>> {
    Ok(table
        .column(column)?
        .enumerate()
        .filter(|(_, value)| value.as_text().is_some_and(|s| accepted.contains(s)))
        .map(|(i, _)| i)
        .collect())
}

/// The sub-table of records carrying one of the given identifiers.
pub fn select_ids(table: &Table, id_column: &str, ids: &[String]) -> Result<Table> {
    let accepted: BTreeSet<String> = ids.iter().cloned().collect();
    let indices = filtered_indices(table, id_column, &accepted)?;
    Ok(table.select(&indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{FieldValue, Record};
    use crate::error::Error;

    fn table() -> Table {
        let mut table = Table::new(vec!["occ_id".into(), "lat".into()]);
        for (id, lat) in [("A", 1.0), ("B", 2.0), ("A", 3.0)] {
            table
                .push(Record::new(vec![FieldValue::Text(id.into()), FieldValue::Float(lat)]))
                .unwrap();
        }
        table
    }

    #[test]
    fn duplicate_identifiers_are_all_selected() {
        let subset = select_ids(&table(), "occ_id", &["A".to_string()]).unwrap();
        let lats: Vec<f64> = subset
            .column("lat")
            .unwrap()
            .filter_map(FieldValue::as_f64)
            .collect();
        assert_eq!(lats, [1.0, 3.0]);
    }

    #[test]
    fn empty_selection_and_numeric_columns_match_nothing() {
        let t = table();
        assert!(filtered_indices(&t, "occ_id", &BTreeSet::new()).unwrap().is_empty());
        let accepted: BTreeSet<String> = ["1".to_string()].into();
        assert!(filtered_indices(&t, "lat", &accepted).unwrap().is_empty());
    }

    #[test]
    fn unknown_column_is_an_error() {
        let err = select_ids(&table(), "nope", &[]).unwrap_err();
        assert!(matches!(err, Error::UnknownColumn(c) if c == "nope"));
    }
}
