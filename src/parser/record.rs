//! Decoder for single lines of an Xdebug computerized trace.
//!
//! A record line looks like:
//!
//! ```text
//! 2	7	0	0.000312	393864	str_replace	0		/var/www/index.php	12	3
//! 2	7	1	0.000329	393904
//! ```
//!
//! Entry records carry the full set of fields, exit records stop after the
//! memory column. Decoding never fails: malformed numbers fall back to zero
//! (see [`lenient`]) and lines that cannot be records are reported as skips.

use crate::utils::config::{HEADER_LINES, MIN_RECORD_FIELDS, RETURN_VALUE_FLAG};

/// Whether a record opens or closes a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Entry,
    Exit,
}

impl EventKind {
    /// Map the numeric flag column to an event kind.
    ///
    /// Only `1` closes a call; zero (including the lenient fallback) opens one.
    fn from_flag(flag: i64) -> Self {
        if flag == 1 {
            EventKind::Exit
        } else {
            EventKind::Entry
        }
    }
}

/// One decoded trace record
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEvent {
    /// Nesting level of the call
    pub depth: u32,

    /// Invocation counter assigned by Xdebug
    pub function_number: u64,

    pub kind: EventKind,

    /// Seconds since the start of the request
    pub timestamp: f64,

    /// Memory watermark in bytes
    pub memory: i64,

    /// Function name, empty on exit records
    pub name: String,

    /// 1 for functions implemented by the engine, 0 for userland
    pub internal: i64,

    /// Path passed to include/require, if any
    pub include_file: String,

    pub filename: String,
    pub line_number: u64,
    pub param_count: u64,

    /// Number of numeric fields that fell back to zero while decoding
    pub defaulted_fields: u8,
}

/// Why a line did not produce an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Part of the fixed header block
    Header,
    /// Fewer tab-separated fields than a record needs
    TooFewFields,
    /// Summary line written after the last record (no depth column)
    Footer,
    /// Return-value record, carries no timing
    ReturnValue,
}

/// Result of decoding one line
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Event(TraceEvent),
    Skipped(SkipReason),
}

/// Lenient numeric field policy.
///
/// Every numeric column is parsed on its own. A value that does not parse is
/// replaced by the type's zero value and the caller is told so, instead of
/// the whole record (or trace) being rejected.
pub mod lenient {
    use std::str::FromStr;

    /// Parse `raw`, returning the value and whether the zero fallback was used.
    pub fn parse<T>(raw: &str) -> (T, bool)
    where
        T: FromStr + Default,
    {
        match raw.trim().parse::<T>() {
            Ok(value) => (value, false),
            Err(_) => (T::default(), true),
        }
    }

    /// Parse `raw` and bump `fallbacks` when the zero fallback was used.
    pub fn field<T>(raw: &str, fallbacks: &mut u8) -> T
    where
        T: FromStr + Default,
    {
        let (value, defaulted) = parse(raw);
        if defaulted {
            *fallbacks = fallbacks.saturating_add(1);
        }
        value
    }

    /// Parse a timestamp. Infinities and NaN count as a fallback too, since
    /// `f64::from_str` accepts them but no trace clock produces them.
    pub fn seconds(raw: &str, fallbacks: &mut u8) -> f64 {
        let value: f64 = field(raw, fallbacks);
        if value.is_finite() {
            value
        } else {
            *fallbacks = fallbacks.saturating_add(1);
            0.0
        }
    }
}

/// Decode one raw line.
///
/// **Public** - main entry point of the record parser
///
/// # Arguments
/// * `line_number` - 1-based position of the line in the file
/// * `line` - raw line, with or without its trailing line terminator
pub fn parse_record(line_number: usize, line: &str) -> LineOutcome {
    if line_number <= HEADER_LINES {
        return LineOutcome::Skipped(SkipReason::Header);
    }

    let line = line.trim_end_matches(['\r', '\n']);
    let fields: Vec<&str> = line.split('\t').collect();

    if fields.len() < MIN_RECORD_FIELDS {
        return LineOutcome::Skipped(SkipReason::TooFewFields);
    }

    if fields[0].trim().is_empty() {
        return LineOutcome::Skipped(SkipReason::Footer);
    }

    if fields[2].trim() == RETURN_VALUE_FLAG {
        return LineOutcome::Skipped(SkipReason::ReturnValue);
    }

    let mut fallbacks = 0u8;
    let text = |index: usize| fields.get(index).map(|s| s.to_string()).unwrap_or_default();

    let depth: u32 = lenient::field(fields[0], &mut fallbacks);
    let function_number: u64 = lenient::field(fields[1], &mut fallbacks);
    let flag: i64 = lenient::field(fields[2], &mut fallbacks);
    let timestamp = lenient::seconds(fields[3], &mut fallbacks);
    let memory: i64 = lenient::field(fields[4], &mut fallbacks);

    // Columns past the memory watermark only exist on entry records
    let optional = |index: usize, fallbacks: &mut u8| -> u64 {
        fields
            .get(index)
            .map(|raw| lenient::field(raw, fallbacks))
            .unwrap_or_default()
    };
    let internal: i64 = fields
        .get(6)
        .map(|raw| lenient::field(raw, &mut fallbacks))
        .unwrap_or_default();
    let line_no = optional(9, &mut fallbacks);
    let param_count = optional(10, &mut fallbacks);

    LineOutcome::Event(TraceEvent {
        depth,
        function_number,
        kind: EventKind::from_flag(flag),
        timestamp,
        memory,
        name: text(5),
        internal,
        include_file: text(7),
        filename: text(8),
        line_number: line_no,
        param_count,
        defaulted_fields: fallbacks,
    })
}
