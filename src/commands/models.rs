use crate::utils::config::DEFAULT_RESULT_LIMIT;
use std::path::PathBuf;

/// Arguments for the analyze command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    /// Xdebug trace file to read
    pub input: PathBuf,

    /// Sort key name (flow, calls, time, memory)
    pub sort_key: String,

    /// Number of rows printed to the terminal
    pub limit: usize,

    /// Also write every ranked row to a CSV file
    pub csv: bool,

    /// Directory the CSV file is written to
    pub csv_dir: PathBuf,

    /// Output path for the JSON report (optional)
    pub json: Option<PathBuf>,

    /// Which call decides a function's flow position (first, last)
    pub flow_anchor: String,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            sort_key: "flow".to_string(),
            limit: DEFAULT_RESULT_LIMIT,
            csv: false,
            csv_dir: PathBuf::from("."),
            json: None,
            flow_anchor: "first".to_string(),
        }
    }
}
