//! Merge radio-occultation soundings stored as netCDF files into one
//! delimited table, read that table back with its profiles as numbers, and
//! run a few numeric post-processing steps on it.
//!
//! ```no_run
//! use occ_merge::{config::MergeConfig, data::merge::merge_to_file};
//!
//! let config = MergeConfig {
//!     directory: "ropp_out".into(),
//!     prefix: "atmPrf_".into(),
//!     output: "merged.csv".into(),
//!     ..Default::default()
//! };
//! let (table, summary) = merge_to_file(&config)?;
//! println!("{} rows, {} files skipped", table.len(), summary.skipped);
//! # Ok::<(), occ_merge::Error>(())
//! ```

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;

pub use error::{Error, Result};
