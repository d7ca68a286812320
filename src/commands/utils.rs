use crate::output::read_report;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Validate a JSON report file
pub fn validate_report_file(file_path: PathBuf) -> Result<()> {
    println!("Validating report: {}", file_path.display());

    let report = read_report(&file_path)
        .with_context(|| format!("Invalid report {}", file_path.display()))?;

    if report.version != SCHEMA_VERSION {
        log::warn!(
            "Report schema v{} differs from current v{}",
            report.version,
            SCHEMA_VERSION
        );
    }

    println!("✓ Valid report JSON");
    println!("  Version: {}", report.version);
    println!("  Source: {}", report.source_file);
    println!("  Sort Key: {}", report.sort_key);
    println!("  Functions: {}", report.functions.len());
    println!("  Lines Read: {}", report.stats.lines_read);
    if report.stats.unterminated_frames > 0 {
        println!("  Unterminated Calls: {}", report.stats.unterminated_frames);
    }

    Ok(())
}

/// Display version information
pub fn display_version() {
    println!("Xdebug Trace Studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Per-function time and memory reports from Xdebug function traces.");
}
