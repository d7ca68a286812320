//! One aggregation pass over a trace.
//!
//! The session owns the call stack tracker, the function aggregator and the
//! pass diagnostics. A new session is needed for every trace.

use super::call_stack::{CallStackTracker, RecursionPeak};
use super::functions::{FlowAnchor, FunctionAggregator, FunctionTable};
use crate::parser::record::{parse_record, EventKind, LineOutcome, SkipReason, TraceEvent};
use crate::parser::xdebug_trace::TraceLines;
use crate::utils::error::TraceError;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::io::BufRead;

/// Diagnostics gathered during a pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStats {
    pub lines_read: usize,
    pub header_lines: usize,
    pub short_lines: usize,
    pub footer_lines: usize,
    pub return_value_lines: usize,
    pub entry_events: u64,
    pub exit_events: u64,
    /// Numeric fields that fell back to zero
    pub defaulted_fields: u64,
    pub unmatched_exits: u64,
    /// Frames still open when the input ended
    pub unterminated_frames: u64,
    /// Frames discarded mid-trace because their exit never arrived
    pub abandoned_frames: u64,
    pub depth_gaps: u64,
    /// Entries skipped because their depth was beyond any real call stack
    #[serde(default)]
    pub rejected_depths: u64,
    pub max_depth: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deepest_recursion: Option<RecursionPeak>,
}

impl TraceStats {
    /// True when the trace ended with calls still open
    pub fn is_truncated(&self) -> bool {
        self.unterminated_frames > 0
    }
}

/// Finished pass: aggregates plus diagnostics
#[derive(Debug, Clone)]
pub struct TraceSummary {
    pub functions: FunctionTable,
    pub stats: TraceStats,
}

/// State of one aggregation pass
#[derive(Debug)]
pub struct AggregationSession {
    tracker: CallStackTracker,
    aggregator: FunctionAggregator,
    stats: TraceStats,
}

impl Default for AggregationSession {
    fn default() -> Self {
        Self::new(FlowAnchor::default())
    }
}

impl AggregationSession {
    pub fn new(anchor: FlowAnchor) -> Self {
        Self {
            tracker: CallStackTracker::new(),
            aggregator: FunctionAggregator::new(anchor),
            stats: TraceStats::default(),
        }
    }

    /// Decode and fold one raw line
    pub fn feed_line(&mut self, line_number: usize, line: &str) {
        self.stats.lines_read += 1;

        match parse_record(line_number, line) {
            LineOutcome::Event(event) => self.feed_event(line_number, &event),
            LineOutcome::Skipped(reason) => match reason {
                SkipReason::Header => self.stats.header_lines += 1,
                SkipReason::TooFewFields => self.stats.short_lines += 1,
                SkipReason::Footer => self.stats.footer_lines += 1,
                SkipReason::ReturnValue => self.stats.return_value_lines += 1,
            },
        }
    }

    /// Fold one decoded event
    pub fn feed_event(&mut self, line_number: usize, event: &TraceEvent) {
        self.stats.defaulted_fields += u64::from(event.defaulted_fields);

        match event.kind {
            EventKind::Entry => {
                self.stats.entry_events += 1;
                self.tracker.enter(event, line_number);
            }
            EventKind::Exit => {
                self.stats.exit_events += 1;
                if let Some(call) = self.tracker.exit(event, line_number) {
                    self.aggregator.record(call);
                }
            }
        }
    }

    /// Number of distinct functions with at least one completed call
    pub fn function_count(&self) -> usize {
        self.aggregator.len()
    }

    /// End the pass
    ///
    /// Frames still open are dropped without touching the aggregates.
    pub fn finish(self) -> TraceSummary {
        let (diagnostics, open_frames) = self.tracker.finish();

        let stats = TraceStats {
            unmatched_exits: diagnostics.unmatched_exits,
            unterminated_frames: open_frames as u64,
            abandoned_frames: diagnostics.abandoned_frames,
            depth_gaps: diagnostics.depth_gaps,
            rejected_depths: diagnostics.rejected_depths,
            max_depth: diagnostics.max_depth,
            deepest_recursion: diagnostics.deepest_recursion,
            ..self.stats
        };

        if stats.is_truncated() {
            warn!(
                "Trace appears truncated: {} call(s) never returned and were left out of the report",
                stats.unterminated_frames
            );
        }
        if stats.unmatched_exits > 0
            || stats.abandoned_frames > 0
            || stats.depth_gaps > 0
            || stats.rejected_depths > 0
        {
            warn!(
                "Trace is not well nested: {} unmatched exit(s), {} abandoned frame(s), {} depth gap(s), {} rejected depth(s)",
                stats.unmatched_exits, stats.abandoned_frames, stats.depth_gaps, stats.rejected_depths
            );
        }
        if stats.defaulted_fields > 0 {
            debug!("{} numeric field(s) could not be parsed and counted as zero", stats.defaulted_fields);
        }

        TraceSummary {
            functions: self.aggregator.into_table(),
            stats,
        }
    }
}

/// Run a full aggregation pass over a trace
///
/// **Public** - main entry point for aggregation
///
/// # Arguments
/// * `reader` - buffered trace input, consumed to the end
/// * `anchor` - which call decides each function's flow position
///
/// # Errors
/// * `TraceError::ReadFailed` - the underlying reader failed mid-trace
pub fn aggregate_trace<R: BufRead>(reader: R, anchor: FlowAnchor) -> Result<TraceSummary, TraceError> {
    let mut session = AggregationSession::new(anchor);

    let mut lines = TraceLines::new(reader);
    for line in lines.by_ref() {
        let (line_number, text) = line?;
        session.feed_line(line_number, &text);
    }

    info!(
        "Aggregated {} lines into {} functions",
        lines.lines_read(),
        session.function_count()
    );

    Ok(session.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "Version: 3.3.1\nFile format: 4\nTRACE START [2024-01-01 10:00:00.000000]\n";

    fn run(body: &str) -> TraceSummary {
        let input = format!("{}{}", HEADER, body);
        aggregate_trace(Cursor::new(input), FlowAnchor::First).unwrap()
    }

    #[test]
    fn test_header_is_never_parsed() {
        let summary = run("");
        assert_eq!(summary.stats.lines_read, 3);
        assert_eq!(summary.stats.header_lines, 3);
        assert!(summary.functions.is_empty());
    }

    #[test]
    fn test_stats_count_skipped_lines() {
        let summary = run(
            "1\t0\t0\t0.000100\t100\t{main}\t1\t\t/app/index.php\t0\t0\n\
             2\t1\tR\t\t\t42\n\
             1\t0\t1\t0.000200\t150\n\
             \t\t\t0.000300\t100\n\
             TRACE END   [2024-01-01 10:00:01.000000]\n",
        );

        let stats = &summary.stats;
        assert_eq!(stats.lines_read, 8);
        assert_eq!(stats.entry_events, 1);
        assert_eq!(stats.exit_events, 1);
        assert_eq!(stats.return_value_lines, 1);
        assert_eq!(stats.footer_lines, 1);
        assert_eq!(stats.short_lines, 1);
        assert!(!stats.is_truncated());
        assert_eq!(summary.functions["{main}"].calls, 1);
    }

    #[test]
    fn test_truncated_trace_is_reported_not_aggregated() {
        let summary = run(
            "1\t0\t0\t0.1\t100\t{main}\n\
             2\t1\t0\t0.2\t200\tslow\n\
             3\t2\t0\t0.3\t300\tfast\n\
             3\t2\t1\t0.4\t350\n",
        );

        assert!(summary.stats.is_truncated());
        assert_eq!(summary.stats.unterminated_frames, 2);
        assert_eq!(summary.functions.len(), 1);
        assert!(summary.functions.contains_key("fast"));
    }

    #[test]
    fn test_impossible_depth_does_not_stop_the_pass() {
        let summary = run(
            "1\t0\t0\t0.1\t100\t{main}\n\
             4294967295\t1\t0\t0.2\t100\tfoo\n\
             2\t2\t0\t0.3\t100\tbar\n\
             2\t2\t1\t0.4\t150\n\
             1\t0\t1\t0.5\t200\n",
        );

        assert_eq!(summary.stats.rejected_depths, 1);
        assert!(!summary.stats.is_truncated());
        assert!(!summary.functions.contains_key("foo"));
        assert_eq!(summary.functions["bar"].time, 100_000);
        assert_eq!(summary.functions["{main}"].time, 400_000);
        assert_eq!(summary.functions["{main}"].nested_time, 100_000);
    }

    #[test]
    fn test_infinite_timestamp_falls_back_to_zero() {
        let summary = run("1\t0\t0\t-inf\t100\t{main}\n1\t0\t1\t0.5\t200\n");

        assert_eq!(summary.stats.defaulted_fields, 1);
        assert_eq!(summary.functions["{main}"].time, 500_000);
        assert_eq!(summary.functions["{main}"].memory, 100);
    }

    #[test]
    fn test_defaulted_fields_are_counted() {
        let summary = run("1\t0\t0\tbad\t100\t{main}\n1\t0\t1\t0.5\toops\n");
        assert_eq!(summary.stats.defaulted_fields, 2);
        assert_eq!(summary.functions["{main}"].time, 500_000);
        assert_eq!(summary.functions["{main}"].memory, -100);
    }
}
