use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, Float32Array, Float64Array, Float64Builder, LargeListArray,
    ListArray, ListBuilder, StringArray,
};
use arrow::datatypes::{DataType, Field, Float32Type, Float64Type, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;

use super::model::{ColumnKind, FieldValue, Record, Table};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Write `table` as Parquet: text columns as `Utf8`, scalars as `Float64`,
/// arrays as `List<Float64>`.  Columns of an empty table are written as
/// `Utf8`.
pub fn write_parquet(table: &Table, path: &Path) -> Result<()> {
    let mut fields = Vec::with_capacity(table.columns().len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.columns().len());

    for (idx, name) in table.columns().iter().enumerate() {
        let kind = table.column_kind(idx).unwrap_or(ColumnKind::Text);
        let cells = table.records().iter().map(|r| &r.values[idx]);
        let (data_type, array) = build_column(name, kind, cells)?;
        fields.push(Field::new(name, data_type, false));
        arrays.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;

    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn build_column<'a>(
    name: &str,
    kind: ColumnKind,
    cells: impl Iterator<Item = &'a FieldValue>,
) -> Result<(DataType, ArrayRef)> {
    let mixed = || Error::MixedColumn(name.to_string());
    match kind {
        ColumnKind::Text => {
            let values = cells
                .map(|c| c.as_text().ok_or_else(mixed))
                .collect::<Result<Vec<&str>>>()?;
            Ok((DataType::Utf8, Arc::new(StringArray::from(values))))
        }
        ColumnKind::Float => {
            let values = cells
                .map(|c| c.as_f64().ok_or_else(mixed))
                .collect::<Result<Vec<f64>>>()?;
            Ok((DataType::Float64, Arc::new(Float64Array::from(values))))
        }
        ColumnKind::Array => {
            let mut builder = ListBuilder::new(Float64Builder::new());
            for cell in cells {
                let FieldValue::Array(row) = cell else {
                    return Err(mixed());
                };
                builder.values().append_slice(row);
                builder.append(true);
            }
            let item = Arc::new(Field::new("item", DataType::Float64, true));
            Ok((DataType::List(item), Arc::new(builder.finish())))
        }
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Load a table written by [`write_parquet`].
pub fn read_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut table = Table::new(columns);
    for batch_result in reader {
        let batch = batch_result?;
        for row in 0..batch.num_rows() {
            let values = batch
                .columns()
                .iter()
                .zip(table.columns())
                .map(|(col, name)| extract_value(col, row, name))
                .collect::<Result<Vec<_>>>()?;
            table.push(Record::new(values))?;
        }
    }
    Ok(table)
}

/// Extract one cell from an Arrow column at a given row.
fn extract_value(col: &ArrayRef, row: usize, name: &str) -> Result<FieldValue> {
    let value = match col.data_type() {
        DataType::Utf8 => FieldValue::Text(if col.is_null(row) {
            String::new()
        } else {
            col.as_string::<i32>().value(row).to_string()
        }),
        DataType::LargeUtf8 => FieldValue::Text(if col.is_null(row) {
            String::new()
        } else {
            col.as_string::<i64>().value(row).to_string()
        }),
        DataType::Float64 => FieldValue::Float(if col.is_null(row) {
            f64::NAN
        } else {
            col.as_primitive::<Float64Type>().value(row)
        }),
        DataType::Float32 => FieldValue::Float(if col.is_null(row) {
            f64::NAN
        } else {
            col.as_primitive::<Float32Type>().value(row) as f64
        }),
        DataType::List(_) | DataType::LargeList(_) => {
            FieldValue::Array(extract_f64_list(col, row, name)?)
        }
        _ => {
            return Err(Error::NotNumeric {
                column: name.to_string(),
            })
        }
    };
    Ok(value)
}

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(col: &ArrayRef, row: usize, name: &str) -> Result<Vec<f64>> {
    if col.is_null(row) {
        return Ok(Vec::new());
    }

    let values_array = if let Some(list) = col.as_any().downcast_ref::<ListArray>() {
        list.value(row)
    } else if let Some(list) = col.as_any().downcast_ref::<LargeListArray>() {
        list.value(row)
    } else {
        return Err(Error::NotNumeric {
            column: name.to_string(),
        });
    };

    // The inner array can be Float64 or Float32
    if let Some(f64_arr) = values_array.as_any().downcast_ref::<Float64Array>() {
        Ok(f64_arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(f32_arr) = values_array.as_any().downcast_ref::<Float32Array>() {
        Ok(f32_arr.iter().map(|v| v.unwrap_or(f32::NAN) as f64).collect())
    } else {
        Err(Error::NotNumeric {
            column: name.to_string(),
        })
    }
}
