//! Ranking of per-function aggregates.
//!
//! Turns the unordered aggregate table into a list ordered by one of the
//! supported sort keys. Ties are broken by function name so identical input
//! always produces identical output.

use super::functions::{FunctionAggregate, FunctionTable};
use crate::utils::config::MICROS_PER_SECOND;
use crate::utils::error::ConfigError;
use log::debug;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Ordering applied to the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Ascending by first appearance in the trace
    #[default]
    Flow,
    /// Descending by call count
    Calls,
    /// Descending by inclusive time
    Time,
    /// Descending by inclusive memory
    Memory,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [SortKey::Flow, SortKey::Calls, SortKey::Time, SortKey::Memory];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Flow => "flow",
            SortKey::Calls => "calls",
            SortKey::Time => "time",
            SortKey::Memory => "memory",
        }
    }

    /// Compare two rows under this key, name breaking ties
    fn compare(&self, a: &FunctionStats, b: &FunctionStats) -> Ordering {
        let primary = match self {
            SortKey::Flow => a.order.cmp(&b.order),
            SortKey::Calls => b.calls.cmp(&a.calls),
            SortKey::Time => b.time.cmp(&a.time),
            SortKey::Memory => b.memory.cmp(&a.memory),
        };
        primary.then_with(|| a.name.cmp(&b.name))
    }
}

impl FromStr for SortKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flow" => Ok(SortKey::Flow),
            "calls" => Ok(SortKey::Calls),
            "time" | "time-inclusive" => Ok(SortKey::Time),
            "memory" | "memory-inclusive" => Ok(SortKey::Memory),
            _ => Err(ConfigError::InvalidSortKey(s.to_string())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one function's totals, with exclusive values derived
///
/// Times are in microseconds, memory in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionStats {
    pub name: String,
    pub calls: u64,
    pub time: i64,
    pub memory: i64,
    pub nested_time: i64,
    pub nested_memory: i64,
    pub own_time: i64,
    pub own_memory: i64,
    pub order: usize,
}

impl FunctionStats {
    /// Snapshot an aggregate
    pub fn from_aggregate(name: &str, aggregate: &FunctionAggregate) -> Self {
        Self {
            name: name.to_string(),
            calls: aggregate.calls,
            time: aggregate.time,
            memory: aggregate.memory,
            nested_time: aggregate.nested_time,
            nested_memory: aggregate.nested_memory,
            own_time: aggregate.own_time(),
            own_memory: aggregate.own_memory(),
            order: aggregate.sequence.unwrap_or(0),
        }
    }
}

/// Rank all functions by a sort key
///
/// **Public** - main entry point for ranking
///
/// # Arguments
/// * `functions` - aggregate table produced by a finished session
/// * `key` - ordering to apply
///
/// # Returns
/// Every function, ordered by `key`
pub fn rank_functions(functions: &FunctionTable, key: SortKey) -> Vec<FunctionStats> {
    debug!("Ranking {} functions by {}", functions.len(), key);

    let mut ranked: Vec<FunctionStats> = functions
        .iter()
        .map(|(name, aggregate)| FunctionStats::from_aggregate(name, aggregate))
        .collect();

    ranked.sort_by(|a, b| key.compare(a, b));
    ranked
}

/// First `limit` rows of a ranked list
pub fn top_functions(ranked: &[FunctionStats], limit: usize) -> &[FunctionStats] {
    &ranked[..limit.min(ranked.len())]
}

/// Totals across all ranked functions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceTotals {
    pub function_count: usize,
    pub total_calls: u64,
    /// Sum of exclusive time over every function
    pub total_own_time: i64,
    /// Function with the largest exclusive time
    pub hottest: Option<String>,
}

impl TraceTotals {
    /// Get human-readable summary
    ///
    /// **Public** - for logging
    pub fn summary(&self) -> String {
        format!(
            "Functions: {} | Calls: {} | Own time: {:.6}s | Hottest: {}",
            self.function_count,
            self.total_calls,
            self.total_own_time as f64 / MICROS_PER_SECOND,
            self.hottest.as_deref().unwrap_or("-")
        )
    }
}

/// Calculate totals over a ranked list
pub fn calculate_totals(ranked: &[FunctionStats]) -> TraceTotals {
    let hottest = ranked
        .iter()
        .max_by(|a, b| a.own_time.cmp(&b.own_time).then_with(|| b.name.cmp(&a.name)))
        .map(|stats| stats.name.clone());

    TraceTotals {
        function_count: ranked.len(),
        total_calls: ranked.iter().map(|s| s.calls).sum(),
        total_own_time: ranked.iter().map(|s| s.own_time).sum(),
        hottest,
    }
}
