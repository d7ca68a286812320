//! CSV export of ranked function rows.
//!
//! The CSV holds every ranked row, regardless of the terminal row limit. A
//! failed export never leaves a partial file behind.

use super::{ensure_parent_dir, validate_path, write_atomically};
use crate::aggregator::{FunctionStats, SortKey};
use crate::parser::schema::format_seconds;
use crate::utils::error::OutputError;
use log::info;
use serde::Serialize;
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Calls")]
    calls: u64,
    #[serde(rename = "Time Inclusive")]
    time_inclusive: String,
    #[serde(rename = "Memory")]
    memory: i64,
    #[serde(rename = "Nested Time")]
    nested_time: String,
    #[serde(rename = "Nested Memory")]
    nested_memory: i64,
    #[serde(rename = "Order")]
    order: usize,
}

impl<'a> From<&'a FunctionStats> for CsvRow<'a> {
    fn from(stats: &'a FunctionStats) -> Self {
        Self {
            name: &stats.name,
            calls: stats.calls,
            time_inclusive: format_seconds(stats.time),
            memory: stats.memory,
            nested_time: format_seconds(stats.nested_time),
            nested_memory: stats.nested_memory,
            order: stats.order,
        }
    }
}

/// Name of the CSV file for a trace: `<inputBaseName>.sorted_by_<sortKey>.csv`
pub fn csv_file_name(input: &Path, sort_key: SortKey) -> String {
    let base = input
        .file_name()
        .unwrap_or_else(|| OsStr::new("trace"))
        .to_string_lossy();
    format!("{}.sorted_by_{}.csv", base, sort_key)
}

/// Write ranked rows as CSV (with a header row) to any writer
pub fn write_csv_to<W: Write>(writer: W, rows: &[FunctionStats]) -> Result<(), OutputError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);

    for stats in rows {
        csv_writer.serialize(CsvRow::from(stats))?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write ranked rows to `<output_dir>/<inputBaseName>.sorted_by_<sortKey>.csv`
///
/// **Public** - main entry point for CSV output
///
/// # Returns
/// Path of the written file
pub fn write_csv(
    rows: &[FunctionStats],
    input: &Path,
    sort_key: SortKey,
    output_dir: &Path,
) -> Result<PathBuf, OutputError> {
    let output_path = output_dir.join(csv_file_name(input, sort_key));

    info!("Writing CSV to: {}", output_path.display());

    validate_path(&output_path)?;
    ensure_parent_dir(&output_path)?;

    write_atomically(&output_path, |file| write_csv_to(file, rows))?;

    info!("CSV written successfully ({} rows)", rows.len());

    Ok(output_path)
}
