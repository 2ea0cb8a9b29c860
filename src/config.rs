use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Variables merged when the caller does not choose its own list.
pub const DEFAULT_VARIABLES: [&str; 15] = [
    "occ_id",
    "start_time",
    "lat",
    "lon",
    "overall_qual",
    "snr_L2p",
    "bangle",
    "impact",
    "impact_opt",
    "refrac",
    "alt_refrac",
    "geop_refrac",
    "undulation",
    "r_coc",
    "roc",
];

pub const DEFAULT_ID_VARIABLE: &str = "occ_id";
pub const DEFAULT_SEPARATOR: char = '|';

// ---------------------------------------------------------------------------
// Serialization options
// ---------------------------------------------------------------------------

/// How floating-point numbers are rendered in the delimited file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FloatFormat {
    /// Shortest text that parses back to the identical `f64`.
    #[default]
    Shortest,
    /// Fixed number of digits after the decimal point.
    Fixed(usize),
}

/// Rendering options for [`crate::data::writer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SerializeOptions {
    pub float_format: FloatFormat,
    /// Wrap array renderings once a line reaches this many characters.
    /// `None` keeps every array on one line.
    pub line_width: Option<usize>,
}

// ---------------------------------------------------------------------------
// Merge configuration
// ---------------------------------------------------------------------------

/// Everything the merge needs: where to look, what to read, where to write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub directory: PathBuf,
    /// Only files whose name starts with this prefix are merged.
    pub prefix: String,
    pub output: PathBuf,
    pub separator: char,
    pub variables: Vec<String>,
    /// Which entry of `variables` is the character-array identifier.
    pub id_variable: String,
    pub serialize: SerializeOptions,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            prefix: String::new(),
            output: PathBuf::from("merged.csv"),
            separator: DEFAULT_SEPARATOR,
            variables: DEFAULT_VARIABLES.iter().map(|v| v.to_string()).collect(),
            id_variable: DEFAULT_ID_VARIABLE.to_string(),
            serialize: SerializeOptions::default(),
        }
    }
}

impl MergeConfig {
    /// Load a configuration from a JSON file.  Missing keys take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            separator: self.separator,
            id_column: self.id_variable.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Read options
// ---------------------------------------------------------------------------

/// Options for reading a merged file back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    pub separator: char,
    /// Column kept as plain text, never re-parsed.
    pub id_column: String,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            id_column: DEFAULT_ID_VARIABLE.to_string(),
        }
    }
}

/// Validate a separator and convert it to the byte the `csv` crate wants.
pub fn separator_byte(separator: char) -> Result<u8> {
    if separator.is_ascii() && !matches!(separator, '"' | '\n' | '\r') {
        Ok(separator as u8)
    } else {
        Err(Error::InvalidSeparator(separator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_lists_fifteen_variables() {
        let config = MergeConfig::default();
        assert_eq!(config.variables.len(), 15);
        assert_eq!(config.variables[0], "occ_id");
        assert_eq!(config.separator, '|');
        assert_eq!(config.serialize.float_format, FloatFormat::Shortest);
        assert_eq!(config.serialize.line_width, None);
    }

    #[test]
    fn json_config_fills_missing_keys_with_defaults() {
        let config: MergeConfig =
            serde_json::from_str(r#"{ "prefix": "atmPrf_", "separator": ";" }"#).unwrap();
        assert_eq!(config.prefix, "atmPrf_");
        assert_eq!(config.separator, ';');
        assert_eq!(config.id_variable, "occ_id");
        assert_eq!(config.variables.len(), 15);
    }

    #[test]
    fn fixed_float_format_parses_from_json() {
        let opts: SerializeOptions =
            serde_json::from_str(r#"{ "float_format": { "fixed": 3 }, "line_width": 75 }"#).unwrap();
        assert_eq!(opts.float_format, FloatFormat::Fixed(3));
        assert_eq!(opts.line_width, Some(75));
    }

    #[test]
    fn separators_are_validated() {
        assert_eq!(separator_byte('|').unwrap(), b'|');
        assert!(matches!(separator_byte('"'), Err(Error::InvalidSeparator('"'))));
        assert!(matches!(separator_byte('é'), Err(Error::InvalidSeparator('é'))));
    }
}
