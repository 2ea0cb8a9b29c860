use std::path::{Path, PathBuf};

use super::model::{FieldValue, Record};
use super::source::{ArrayFile, NetcdfFile, RawVariable};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// List the files in `directory` whose name starts with `prefix`, in the
/// order the directory listing yields them.  Symbolic links to files count.
pub fn matching_files(directory: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            log::debug!("skipping non UTF-8 file name {name:?}");
            continue;
        };
        if name.starts_with(prefix) && entry.path().is_file() {
            files.push(entry.path());
        }
    }
    Ok(files)
}

/// Open and extract one file.  Errors that only concern this file (open
/// failure, missing variable, bad identifier) come back as `Ok(None)` after
/// a warning.
pub fn scan_file(path: &Path, variables: &[String], id_variable: &str) -> Result<Option<Record>> {
    let result = NetcdfFile::open(path)
        .and_then(|file| extract_record(&file, variables, id_variable));
    match result {
        Ok(record) => Ok(Some(record)),
        Err(e) if e.is_skippable() => {
            log::warn!("skipping dataset, it is either corrupted or did not process right: {e}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Build one record from an opened file.  Fails as a whole on the first
/// missing variable; no partial record is produced.
pub fn extract_record(
    file: &dyn ArrayFile,
    variables: &[String],
    id_variable: &str,
) -> Result<Record> {
    let mut values = Vec::with_capacity(variables.len());
    for name in variables {
        let raw = file
            .read_first_slice(name)?
            .ok_or_else(|| Error::MissingVariable {
                path: file.path().to_path_buf(),
                variable: name.clone(),
            })?;

        let value = if name == id_variable {
            FieldValue::Text(decode_identifier(file.path(), name, raw)?)
        } else {
            numeric_value(raw)
        };
        values.push(value);
    }
    Ok(Record::new(values))
}

/// Concatenate the unmasked bytes of a character variable as UTF-8.
fn decode_identifier(path: &Path, name: &str, raw: RawVariable) -> Result<String> {
    let bytes: Vec<u8> = match raw {
        RawVariable::Chars(chars) => chars.into_iter().flatten().collect(),
        // A numeric identifier keeps its text form.
        RawVariable::Numbers { values, .. } => {
            let text: Vec<String> = values
                .into_iter()
                .flatten()
                .map(|v| v.to_string())
                .collect();
            text.concat().into_bytes()
        }
    };
    String::from_utf8(bytes).map_err(|source| Error::InvalidIdentifier {
        path: path.to_path_buf(),
        variable: name.to_string(),
        source,
    })
}

/// Masked entries become `NaN`.
fn numeric_value(raw: RawVariable) -> FieldValue {
    match raw {
        RawVariable::Numbers { values, scalar } => {
            let values: Vec<f64> = values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
            if scalar {
                FieldValue::Float(values.first().copied().unwrap_or(f64::NAN))
            } else {
                FieldValue::Array(values)
            }
        }
        RawVariable::Chars(chars) => {
            let bytes: Vec<u8> = chars.into_iter().flatten().collect();
            FieldValue::Text(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}
