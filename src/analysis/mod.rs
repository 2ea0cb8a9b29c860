//! Numeric post-processing of a merged table: finite differences,
//! logarithmic slopes and binned averages.

pub mod binning;
pub mod derivative;
