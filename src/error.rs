use std::path::PathBuf;
use std::string::FromUtf8Error;

// ---------------------------------------------------------------------------
// Error – everything the library can report
// ---------------------------------------------------------------------------

/// Errors produced while scanning, merging, writing, reading or analysing
/// occultation tables.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configured variable is absent from a source file.  The file is
    /// treated as corrupted and skipped by the scanner.
    #[error("{}: variable '{variable}' not found (corrupted or partially processed file)", path.display())]
    MissingVariable { path: PathBuf, variable: String },

    /// The identifier bytes are not valid UTF-8.
    #[error("{}: identifier variable '{variable}' is not valid UTF-8", path.display())]
    InvalidIdentifier {
        path: PathBuf,
        variable: String,
        #[source]
        source: FromUtf8Error,
    },

    #[error("{}: netCDF error", path.display())]
    NetCdf {
        path: PathBuf,
        #[source]
        source: netcdf::Error,
    },

    /// The delimited file was not produced by [`crate::data::writer`].
    #[error("{}: malformed merged file at line {line}, column '{column}': {reason}", path.display())]
    MalformedMergedFile {
        path: PathBuf,
        line: u64,
        column: String,
        reason: String,
    },

    #[error("separator {0:?} must be a single ASCII character other than a quote or newline")]
    InvalidSeparator(char),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("column '{0}' already exists")]
    DuplicateColumn(String),

    #[error("record has {found} fields but the table has {expected} columns")]
    SchemaMismatch { expected: usize, found: usize },

    #[error("column '{column}': expected {expected} values, found {found}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("column '{0}' mixes text, scalar and array values")]
    MixedColumn(String),

    #[error("column '{column}' does not hold numeric values")]
    NotNumeric { column: String },

    #[error("invalid bins: start={start}, stop={stop}, width={width}")]
    InvalidBins { start: f64, stop: f64, width: f64 },

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error marks a single source file as unusable, so the
    /// scan should skip it and carry on.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Error::MissingVariable { .. } | Error::InvalidIdentifier { .. } | Error::NetCdf { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
