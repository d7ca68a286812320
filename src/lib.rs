//! Xdebug Trace Studio
//!
//! Per-function time and memory reports from Xdebug function traces.
//!
//! The library reads the tab-separated "computerized" trace format,
//! rebuilds the call stack from entry/exit records and reports, for every
//! function, its call count, inclusive and nested time and memory, and the
//! point in the trace where it first ran.
//!
//! ## Getting Started
//!
//! Most users should install and use the CLI:
//!
//! ```bash
//! cargo install xdebug-trace-studio
//! xdebug-trace analyze --file /tmp/trace.1234.xt --sort-key time
//! ```
//!
//! Library use:
//!
//! ```no_run
//! use xdebug_trace_studio::aggregator::{aggregate_trace, rank_functions, FlowAnchor, SortKey};
//! use xdebug_trace_studio::parser::open_trace;
//!
//! # fn main() -> anyhow::Result<()> {
//! let summary = aggregate_trace(open_trace("trace.xt")?, FlowAnchor::First)?;
//! for row in rank_functions(&summary.functions, SortKey::Calls).iter().take(10) {
//!     println!("{} {}", row.name, row.calls);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod commands;
pub mod output;
pub mod parser;
pub mod utils;
