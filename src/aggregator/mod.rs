//! Aggregation of trace events into per-function statistics.
//!
//! This module turns parsed trace records into:
//! - Matched calls with inclusive and nested cost (call_stack)
//! - Per-function totals guarded against recursive double counting (functions)
//! - Ranked report rows (metrics)
//!
//! `session` ties the pieces together for one pass over a trace.

pub mod call_stack;
pub mod functions;
pub mod metrics;
pub mod session;

// Re-export main types and functions
pub use call_stack::{CallStackTracker, CompletedCall, RecursionPeak, StackFrame};
pub use functions::{FlowAnchor, FunctionAggregate, FunctionAggregator, FunctionTable};
pub use metrics::{calculate_totals, rank_functions, top_functions, FunctionStats, SortKey, TraceTotals};
pub use session::{aggregate_trace, AggregationSession, TraceStats, TraceSummary};
