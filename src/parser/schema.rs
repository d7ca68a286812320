//! Output schema definitions for report data.
//!
//! This module defines the structure of the JSON report we write to disk and
//! the row shape shared by the table and CSV writers.
//! Schema is versioned to allow future evolution.

use crate::aggregator::{FlowAnchor, FunctionStats, SortKey, TraceStats};
use crate::utils::config::{MICROS_PER_SECOND, SCHEMA_VERSION};
use serde::{Deserialize, Serialize};

/// Column titles of the tabular report, in order
pub const REPORT_COLUMNS: [&str; 7] = [
    "Name",
    "Calls",
    "Time Inclusive",
    "Memory",
    "Nested Time",
    "Nested Memory",
    "Order",
];

/// Top-level report structure written to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Schema version for compatibility checking
    pub version: String,

    /// Trace file the report was built from
    pub source_file: String,

    /// Sort key the rows are ordered by
    pub sort_key: String,

    /// Which call decided each function's flow position
    pub flow_anchor: String,

    /// Pass diagnostics
    pub stats: TraceStats,

    /// Every function, ranked (not truncated)
    pub functions: Vec<FunctionRow>,

    /// Timestamp when the report was generated
    pub generated_at: String,
}

/// One function in the JSON report
///
/// Times are seconds, memory is bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionRow {
    pub name: String,
    pub calls: u64,
    pub time_inclusive: f64,
    pub memory_inclusive: i64,
    pub nested_time: f64,
    pub nested_memory: i64,
    pub own_time: f64,
    pub own_memory: i64,
    pub order: usize,
}

impl From<&FunctionStats> for FunctionRow {
    fn from(stats: &FunctionStats) -> Self {
        Self {
            name: stats.name.clone(),
            calls: stats.calls,
            time_inclusive: micros_to_seconds(stats.time),
            memory_inclusive: stats.memory,
            nested_time: micros_to_seconds(stats.nested_time),
            nested_memory: stats.nested_memory,
            own_time: micros_to_seconds(stats.own_time),
            own_memory: stats.own_memory,
            order: stats.order,
        }
    }
}

/// Convert microseconds to seconds
pub fn micros_to_seconds(micros: i64) -> f64 {
    micros as f64 / MICROS_PER_SECOND
}

/// Render microseconds as seconds with six decimals, the trace's own precision
pub fn format_seconds(micros: i64) -> String {
    let sign = if micros < 0 { "-" } else { "" };
    let abs = micros.unsigned_abs();
    format!("{}{}.{:06}", sign, abs / 1_000_000, abs % 1_000_000)
}

/// Cells of one tabular row, in `REPORT_COLUMNS` order
pub fn row_cells(stats: &FunctionStats) -> [String; 7] {
    [
        stats.name.clone(),
        stats.calls.to_string(),
        format_seconds(stats.time),
        stats.memory.to_string(),
        format_seconds(stats.nested_time),
        stats.nested_memory.to_string(),
        stats.order.to_string(),
    ]
}

/// Build the JSON report for a finished pass
///
/// **Public** - used by commands to create final output
pub fn to_report(
    source_file: &str,
    sort_key: SortKey,
    flow_anchor: FlowAnchor,
    stats: &TraceStats,
    ranked: &[FunctionStats],
) -> Report {
    use chrono::Utc;

    Report {
        version: SCHEMA_VERSION.to_string(),
        source_file: source_file.to_string(),
        sort_key: sort_key.to_string(),
        flow_anchor: flow_anchor.to_string(),
        stats: stats.clone(),
        functions: ranked.iter().map(FunctionRow::from).collect(),
        generated_at: Utc::now().to_rfc3339(),
    }
}
