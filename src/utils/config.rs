//! Configuration and constants for the CLI.

/// Current JSON report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

// Xdebug writes "Version:", "File format:" and "TRACE START" before the
// first record. These lines are skipped without looking at them.
pub const HEADER_LINES: usize = 3;

/// Records with fewer tab-separated fields than this are ignored
pub const MIN_RECORD_FIELDS: usize = 5;

/// Default number of rows printed to the terminal
pub const DEFAULT_RESULT_LIMIT: usize = 25;

/// Upper bound accepted for `--limit`
pub const MAX_RESULT_LIMIT: usize = 100_000;

// Xdebug timestamps carry six decimals, so whole microseconds are lossless
pub const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Flag value written by Xdebug for return-value records
pub const RETURN_VALUE_FLAG: &str = "R";

/// Environment variables consulted by the CLI
pub const ENV_SORT_KEY: &str = "XDEBUG_TRACE_SORT_KEY";
pub const ENV_RESULT_LIMIT: &str = "XDEBUG_TRACE_LIMIT";

// Xdebug stops at xdebug.max_nesting_level (512 by default); entries deeper
// than this are treated as corrupt and skipped
pub const MAX_STACK_DEPTH: u32 = 65_536;
