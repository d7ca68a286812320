//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading a trace file
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Trace file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to open trace file {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read trace at line {line}: {source}")]
    ReadFailed {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while interpreting user configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid sort key '{0}' (expected one of: flow, calls, time, memory)")]
    InvalidSortKey(String),

    #[error("Invalid flow anchor '{0}' (expected 'first' or 'last')")]
    InvalidFlowAnchor(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Failed to write CSV: {0}")]
    CsvFailed(#[from] csv::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
