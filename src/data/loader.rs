use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use super::model::{ColumnKind, FieldValue, Record, Table};
use super::parquet_io::read_parquet;
use crate::config::{separator_byte, ReadOptions};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a merged table.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` / `.psv` – delimited text written by [`super::writer`]
/// * `.parquet` / `.pq`       – Parquet written by [`super::parquet_io`]
pub fn load_table(path: &Path, options: &ReadOptions) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" | "txt" | "psv" => read_merged(path, options),
        "parquet" | "pq" => read_parquet(path),
        other => Err(Error::UnsupportedExtension(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Delimited-text deserializer
// ---------------------------------------------------------------------------

/// Read a file produced by [`super::writer::write_table`] and turn the
/// array renderings back into numbers.
///
/// This is not a general CSV reader.  Input that does not follow the
/// writer's layout fails with [`Error::MalformedMergedFile`].
pub fn read_merged(path: &Path, options: &ReadOptions) -> Result<Table> {
    let file = std::fs::File::open(path)?;
    read_merged_from(file, path, options)
}

/// Same as [`read_merged`] for any reader; `path` only labels errors.
pub fn read_merged_from<R: Read>(reader: R, path: &Path, options: &ReadOptions) -> Result<Table> {
    let malformed = |line: u64, column: &str, reason: String| Error::MalformedMergedFile {
        path: path.to_path_buf(),
        line,
        column: column.to_string(),
        reason,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(separator_byte(options.separator)?)
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| malformed(1, "", e.to_string()))?
        .clone();

    // (position in the file, column name) for every column that is kept.
    let kept: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !is_index_header(h))
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut rows: Vec<(u64, StringRecord)> = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or(0);
            malformed(line, "", e.to_string())
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        rows.push((line, record));
    }

    let kinds: Vec<ColumnKind> = kept
        .iter()
        .map(|(pos, name)| {
            if *name == options.id_column {
                return ColumnKind::Text;
            }
            column_kind(rows.iter().map(|(_, row)| row.get(*pos).unwrap_or("")))
        })
        .collect();

    let mut table = Table::new(kept.iter().map(|(_, name)| name.clone()).collect());
    for (line, row) in &rows {
        let mut values = Vec::with_capacity(kept.len());
        for ((pos, name), kind) in kept.iter().zip(&kinds) {
            let cell = row.get(*pos).unwrap_or("");
            let value = parse_cell(cell, *kind).map_err(|reason| malformed(*line, name, reason))?;
            values.push(value);
        }
        table.push(Record::new(values))?;
    }

    log::debug!(
        "{}: read {} rows, {} columns",
        path.display(),
        table.len(),
        table.columns().len()
    );
    Ok(table)
}

/// The positional index column: empty header as written, or the
/// `Unnamed: N` name other tools give it.
fn is_index_header(header: &str) -> bool {
    header.is_empty() || header.starts_with("Unnamed:")
}

/// Kind of a non-identifier column, from all of its cells.
///
/// * First non-empty cell bracketed: array column, every cell must parse.
/// * Every cell empty or a number: float column.
/// * Anything else: text, kept as written.
fn column_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut cells = cells.map(str::trim).filter(|c| !c.is_empty()).peekable();
    if cells.peek().is_some_and(|c| c.starts_with('[')) {
        ColumnKind::Array
    } else if cells.all(|c| c.parse::<f64>().is_ok()) {
        ColumnKind::Float
    } else {
        ColumnKind::Text
    }
}

fn parse_cell(cell: &str, kind: ColumnKind) -> std::result::Result<FieldValue, String> {
    match kind {
        ColumnKind::Text => Ok(FieldValue::Text(cell.to_string())),
        ColumnKind::Float => {
            let cell = cell.trim();
            if cell.is_empty() {
                return Ok(FieldValue::Float(f64::NAN));
            }
            cell.parse::<f64>()
                .map(FieldValue::Float)
                .map_err(|_| format!("'{cell}' is not a number"))
        }
        ColumnKind::Array => parse_array(cell).map(FieldValue::Array),
    }
}

/// Undo [`super::writer::render_array`]: drop line breaks, strip the
/// brackets, split on whitespace, parse every token.
pub fn parse_array(cell: &str) -> std::result::Result<Vec<f64>, String> {
    let flat: String = cell.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    let inner = flat
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| format!("'{}' is not a bracketed array", truncate(&flat)))?;

    inner
        .split_whitespace()
        .enumerate()
        .map(|(j, tok)| {
            tok.parse::<f64>()
                .map_err(|_| format!("element {j}: '{tok}' is not a number"))
        })
        .collect()
}

fn truncate(s: &str) -> &str {
    match s.char_indices().nth(40) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
