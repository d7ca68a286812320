//! Per-function accumulation of completed calls.
//!
//! Every completed call bumps the call count of its function. Time, memory
//! and the flow position are only folded in when no outer invocation of the
//! same function is still running, so a recursive function's inclusive cost
//! is its outermost span and not the sum of every nested span.

use super::call_stack::CompletedCall;
use crate::utils::error::ConfigError;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Which qualifying call decides a function's flow position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowAnchor {
    /// Entry line of the first top-level call. Differs from the classic
    /// overwrite-on-every-call ordering, which `Last` reproduces.
    #[default]
    First,
    /// Entry line of the most recent top-level call
    Last,
}

impl FlowAnchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowAnchor::First => "first",
            FlowAnchor::Last => "last",
        }
    }
}

impl FromStr for FlowAnchor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" => Ok(FlowAnchor::First),
            "last" => Ok(FlowAnchor::Last),
            _ => Err(ConfigError::InvalidFlowAnchor(s.to_string())),
        }
    }
}

impl fmt::Display for FlowAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running totals for one function name
///
/// Times are in microseconds, memory in bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionAggregate {
    pub calls: u64,
    pub time: i64,
    pub memory: i64,
    pub nested_time: i64,
    pub nested_memory: i64,
    /// Line number used for flow ordering, unset until a top-level call completes
    pub sequence: Option<usize>,
}

impl FunctionAggregate {
    /// Inclusive time minus time spent in callees
    pub fn own_time(&self) -> i64 {
        self.time.saturating_sub(self.nested_time)
    }

    /// Inclusive memory minus memory attributed to callees
    pub fn own_memory(&self) -> i64 {
        self.memory.saturating_sub(self.nested_memory)
    }
}

/// Map of function name to aggregate
pub type FunctionTable = HashMap<String, FunctionAggregate>;

/// Folds completed calls into per-function aggregates
#[derive(Debug, Default)]
pub struct FunctionAggregator {
    functions: FunctionTable,
    anchor: FlowAnchor,
}

impl FunctionAggregator {
    pub fn new(anchor: FlowAnchor) -> Self {
        Self {
            functions: HashMap::new(),
            anchor,
        }
    }

    /// Fold one completed call into its function's aggregate
    ///
    /// **Public** - called by the session for every matched exit
    pub fn record(&mut self, call: CompletedCall) {
        let anchor = self.anchor;
        let aggregate = self.functions.entry(call.function).or_default();

        aggregate.calls += 1;

        if call.outer_active {
            return;
        }

        aggregate.time = aggregate.time.saturating_add(call.time);
        aggregate.memory = aggregate.memory.saturating_add(call.memory);
        aggregate.nested_time = aggregate.nested_time.saturating_add(call.nested_time);
        aggregate.nested_memory = aggregate.nested_memory.saturating_add(call.nested_memory);

        match anchor {
            FlowAnchor::First => {
                aggregate.sequence.get_or_insert(call.sequence);
            }
            FlowAnchor::Last => aggregate.sequence = Some(call.sequence),
        }
    }

    pub fn get(&self, function: &str) -> Option<&FunctionAggregate> {
        self.functions.get(function)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn into_table(self) -> FunctionTable {
        self.functions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(function: &str, time: i64, nested_time: i64, sequence: usize, outer_active: bool) -> CompletedCall {
        CompletedCall {
            function: function.to_string(),
            time,
            memory: time * 10,
            nested_time,
            nested_memory: nested_time * 10,
            sequence,
            outer_active,
        }
    }

    #[test]
    fn test_record_accumulates() {
        let mut aggregator = FunctionAggregator::new(FlowAnchor::First);
        aggregator.record(call("foo", 300, 100, 5, false));
        aggregator.record(call("foo", 200, 0, 9, false));

        let foo = aggregator.get("foo").unwrap();
        assert_eq!(foo.calls, 2);
        assert_eq!(foo.time, 500);
        assert_eq!(foo.memory, 5000);
        assert_eq!(foo.nested_time, 100);
        assert_eq!(foo.own_time(), 400);
        assert_eq!(foo.own_memory(), 4000);
        assert_eq!(foo.sequence, Some(5));
    }

    #[test]
    fn test_recursion_guard_only_counts_calls() {
        let mut aggregator = FunctionAggregator::new(FlowAnchor::First);
        aggregator.record(call("fib", 50, 0, 6, true));
        aggregator.record(call("fib", 120, 50, 4, false));

        let fib = aggregator.get("fib").unwrap();
        assert_eq!(fib.calls, 2);
        assert_eq!(fib.time, 120);
        assert_eq!(fib.nested_time, 50);
        assert_eq!(fib.sequence, Some(4));
    }

    #[test]
    fn test_flow_anchor_last_overwrites() {
        let mut aggregator = FunctionAggregator::new(FlowAnchor::Last);
        aggregator.record(call("foo", 1, 0, 5, false));
        aggregator.record(call("foo", 1, 0, 9, false));
        aggregator.record(call("foo", 1, 0, 12, true));

        assert_eq!(aggregator.get("foo").unwrap().sequence, Some(9));
    }

    #[test]
    fn test_record_saturates_instead_of_wrapping() {
        let mut aggregator = FunctionAggregator::new(FlowAnchor::First);
        aggregator.record(CompletedCall {
            function: "hot".to_string(),
            time: i64::MAX - 10,
            memory: i64::MIN + 10,
            nested_time: i64::MIN + 10,
            nested_memory: 0,
            sequence: 1,
            outer_active: false,
        });
        aggregator.record(call("hot", 100, 0, 2, false));

        let hot = aggregator.get("hot").unwrap();
        assert_eq!(hot.calls, 2);
        assert_eq!(hot.time, i64::MAX);
        assert_eq!(hot.memory, i64::MIN + 1010);
        assert_eq!(hot.own_time(), i64::MAX);
    }

    #[test]
    fn test_flow_anchor_parsing() {
        assert_eq!("first".parse::<FlowAnchor>().unwrap(), FlowAnchor::First);
        assert_eq!("LAST".parse::<FlowAnchor>().unwrap(), FlowAnchor::Last);
        assert!("middle".parse::<FlowAnchor>().is_err());
        assert_eq!(FlowAnchor::default(), FlowAnchor::First);
    }
}
