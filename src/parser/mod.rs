//! Trace parsing and schema definitions.
//!
//! This module handles:
//! - Reading trace files line by line
//! - Decoding records with the lenient field policy
//! - Defining the report schema

pub mod record;
pub mod schema;
pub mod xdebug_trace;

// Re-export main types
pub use record::{parse_record, EventKind, LineOutcome, SkipReason, TraceEvent};
pub use schema::{format_seconds, row_cells, to_report, FunctionRow, Report, REPORT_COLUMNS};
pub use xdebug_trace::{open_trace, TraceLines};
