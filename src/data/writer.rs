use std::io::Write;
use std::path::Path;

use super::model::{FieldValue, Table};
use crate::config::{separator_byte, FloatFormat, SerializeOptions};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Delimited-text serializer
// ---------------------------------------------------------------------------

/// Write `table` to `path`.
///
/// Layout: a header row, then one line per record.  The first column is a
/// positional row index with an empty header; the remaining columns follow
/// the table schema.  Arrays are written as `[v0 v1 ...]`, missing values
/// as `nan`.
pub fn write_table(
    table: &Table,
    path: &Path,
    separator: char,
    options: &SerializeOptions,
) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_table_to(table, std::io::BufWriter::new(file), separator, options)
}

/// Same as [`write_table`] for any writer.
pub fn write_table_to<W: Write>(
    table: &Table,
    writer: W,
    separator: char,
    options: &SerializeOptions,
) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(separator_byte(separator)?)
        .from_writer(writer);

    let mut header = Vec::with_capacity(table.columns().len() + 1);
    header.push(String::new());
    header.extend(table.columns().iter().cloned());
    wtr.write_record(&header)?;

    for (index, record) in table.records().iter().enumerate() {
        let mut row = Vec::with_capacity(record.values.len() + 1);
        row.push(index.to_string());
        row.extend(record.values.iter().map(|v| render_value(v, options)));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Text form of one cell.
pub fn render_value(value: &FieldValue, options: &SerializeOptions) -> String {
    match value {
        FieldValue::Text(s) => s.clone(),
        FieldValue::Float(v) => format_float(*v, options.float_format),
        FieldValue::Array(values) => render_array(values, options),
    }
}

/// `[v0 v1 ...]`, wrapped onto continuation lines starting with a space
/// once `line_width` is reached.
pub fn render_array(values: &[f64], options: &SerializeOptions) -> String {
    let mut out = String::from("[");
    let mut line_len = 1;
    for (i, &v) in values.iter().enumerate() {
        let token = format_float(v, options.float_format);
        if i > 0 {
            match options.line_width {
                Some(width) if line_len + 1 + token.len() > width => {
                    out.push_str("\n ");
                    line_len = 1;
                }
                _ => {
                    out.push(' ');
                    line_len += 1;
                }
            }
        }
        out.push_str(&token);
        line_len += token.len();
    }
    out.push(']');
    out
}

pub fn format_float(v: f64, format: FloatFormat) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    match format {
        // Debug output is the shortest round-trip form and switches to
        // exponent notation for very large or small magnitudes.
        FloatFormat::Shortest => format!("{v:?}"),
        FloatFormat::Fixed(digits) => format!("{v:.digits$}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;

    fn sample_table() -> Table {
        let mut table = Table::new(vec!["occ_id".into(), "lat".into(), "bangle".into()]);
        table
            .push(Record::new(vec![
                FieldValue::Text("G01_2019.001".into()),
                FieldValue::Float(-12.5),
                FieldValue::Array(vec![0.5, f64::NAN, 2.0]),
            ]))
            .unwrap();
        table
    }

    fn to_string(table: &Table, options: &SerializeOptions) -> String {
        let mut buf = Vec::new();
        write_table_to(table, &mut buf, '|', options).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn writes_index_column_and_bracketed_arrays() {
        let text = to_string(&sample_table(), &SerializeOptions::default());
        assert_eq!(text, "|occ_id|lat|bangle\n0|G01_2019.001|-12.5|[0.5 nan 2.0]\n");
    }

    #[test]
    fn empty_table_writes_header_only() {
        let table = Table::new(vec!["occ_id".into(), "lat".into()]);
        let text = to_string(&table, &SerializeOptions::default());
        assert_eq!(text, "|occ_id|lat\n");
    }

    #[test]
    fn fixed_format_rounds() {
        assert_eq!(format_float(1.0 / 3.0, FloatFormat::Fixed(3)), "0.333");
        assert_eq!(format_float(f64::NEG_INFINITY, FloatFormat::Fixed(3)), "-inf");
        assert_eq!(format_float(1e300, FloatFormat::Shortest), "1e300");
    }

    #[test]
    fn long_arrays_wrap_when_a_line_width_is_set() {
        let options = SerializeOptions {
            line_width: Some(12),
            ..Default::default()
        };
        let rendered = render_array(&[1.0, 2.0, 3.0, 4.0, 5.0], &options);
        assert_eq!(rendered, "[1.0 2.0 3.0\n 4.0 5.0]");
        assert!(rendered.lines().all(|l| l.len() <= 12));
    }

    #[test]
    fn separator_inside_identifier_is_quoted() {
        let mut table = Table::new(vec!["occ_id".into()]);
        table
            .push(Record::new(vec![FieldValue::Text("a|b".into())]))
            .unwrap();
        let text = to_string(&table, &SerializeOptions::default());
        assert_eq!(text, "|occ_id\n0|\"a|b\"\n");
    }
}
