//! Data layer: core types, scanning, merging and the merged-file format.
//!
//! Architecture:
//! ```text
//!  directory of .nc soundings
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  scan    │  prefix filter, open, extract → Record
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  merge   │  accumulate records → Table
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐        ┌──────────┐
//!   │  writer  │ ─────▶ │  loader  │  delimited text, arrays re-parsed
//!   └──────────┘        └──────────┘
//!        │ (optional)
//!        ▼
//!   ┌──────────┐
//!   │ parquet  │  binary interchange with list columns
//!   └──────────┘
//! ```

pub mod filter;
pub mod loader;
pub mod merge;
pub mod model;
pub mod parquet_io;
pub mod sample;
pub mod scan;
pub mod source;
pub mod writer;
