use std::path::Path;

use super::model::{Record, Table};
use super::scan::{matching_files, scan_file};
use super::writer::write_table;
use crate::config::MergeConfig;
use crate::error::Result;

/// Counts reported after a directory merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeSummary {
    pub matched: usize,
    pub merged: usize,
    pub skipped: usize,
}

/// Append one record and hand the table back.
pub fn accumulate(mut table: Table, record: Record) -> Result<Table> {
    table.push(record)?;
    Ok(table)
}

/// Scan `directory` and merge every file whose name starts with `prefix`.
/// Files that fail extraction are skipped with a warning.  Row order is the
/// directory listing order.
pub fn merge_directory(
    directory: &Path,
    prefix: &str,
    variables: &[String],
    id_variable: &str,
) -> Result<(Table, MergeSummary)> {
    let files = matching_files(directory, prefix)?;
    let mut summary = MergeSummary {
        matched: files.len(),
        ..Default::default()
    };

    let mut table = Table::new(variables.to_vec());
    for path in &files {
        log::debug!("reading {}", path.display());
        match scan_file(path, variables, id_variable)? {
            Some(record) => {
                table = accumulate(table, record)?;
                summary.merged += 1;
            }
            None => summary.skipped += 1,
        }
    }

    log::info!(
        "{}: {} files matched '{prefix}', {} merged, {} skipped",
        directory.display(),
        summary.matched,
        summary.merged,
        summary.skipped
    );
    Ok((table, summary))
}

/// Merge according to `config`, write the delimited file to
/// `config.output` and return the table.
pub fn merge_to_file(config: &MergeConfig) -> Result<(Table, MergeSummary)> {
    let (table, summary) = merge_directory(
        &config.directory,
        &config.prefix,
        &config.variables,
        &config.id_variable,
    )?;
    write_table(&table, &config.output, config.separator, &config.serialize)?;
    log::info!("wrote {} rows to {}", table.len(), config.output.display());
    Ok((table, summary))
}
