//! Analyze command implementation.
//!
//! The analyze command:
//! 1. Opens the trace file
//! 2. Aggregates every record into per-function totals
//! 3. Ranks functions by the chosen sort key
//! 4. Writes the optional CSV and JSON outputs
//! 5. Prints the truncated table

use super::models::AnalyzeArgs;
use crate::aggregator::{
    aggregate_trace, calculate_totals, rank_functions, top_functions, FlowAnchor, FunctionStats,
    SortKey, TraceStats,
};
use crate::output::{render_table, write_csv, write_report};
use crate::parser::{open_trace, to_report};
use crate::utils::config::MAX_RESULT_LIMIT;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::Instant;

/// Result of an analysis run
#[derive(Debug, Clone)]
pub struct Analysis {
    pub sort_key: SortKey,
    /// Every function, ranked
    pub ranked: Vec<FunctionStats>,
    pub stats: TraceStats,
    pub limit: usize,
    /// Where the CSV was written, if requested
    pub csv_path: Option<PathBuf>,
}

impl Analysis {
    /// Rows shown on the terminal
    pub fn visible_rows(&self) -> &[FunctionStats] {
        top_functions(&self.ranked, self.limit)
    }
}

/// Validate analyze arguments
///
/// **Public** - called before any parsing so bad input fails fast
///
/// # Returns
/// Ok if arguments are valid, Err with message if not
pub fn validate_args(args: &AnalyzeArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Trace file path cannot be empty");
    }

    if !args.input.exists() {
        anyhow::bail!("Trace file does not exist: {}", args.input.display());
    }

    if args.input.is_dir() {
        anyhow::bail!("Trace path is a directory: {}", args.input.display());
    }

    args.sort_key.parse::<SortKey>()?;
    args.flow_anchor.parse::<FlowAnchor>()?;

    if args.limit == 0 {
        anyhow::bail!("limit must be greater than 0");
    }

    if args.limit > MAX_RESULT_LIMIT {
        anyhow::bail!("limit is too large (max {})", MAX_RESULT_LIMIT);
    }

    Ok(())
}

/// Aggregate, rank and write file outputs without printing
///
/// **Public** - used by execute_analyze and integration tests
pub fn run_analysis(args: &AnalyzeArgs) -> Result<Analysis> {
    let sort_key: SortKey = args.sort_key.parse()?;
    let anchor: FlowAnchor = args.flow_anchor.parse()?;

    // Step 1: Open trace
    info!("Step 1/4: Opening trace {}...", args.input.display());
    let reader = open_trace(&args.input).context("Failed to open trace file")?;

    // Step 2: Aggregate
    info!("Step 2/4: Aggregating trace records...");
    let summary = aggregate_trace(reader, anchor).context("Failed to read trace file")?;

    debug!(
        "Trace: {} entries, {} exits, max depth {}",
        summary.stats.entry_events, summary.stats.exit_events, summary.stats.max_depth
    );
    if let Some(peak) = &summary.stats.deepest_recursion {
        debug!("Deepest recursion: {} nested {} times", peak.function, peak.depth);
    }

    // Step 3: Rank
    info!("Step 3/4: Ranking functions by {}...", sort_key);
    let ranked = rank_functions(&summary.functions, sort_key);
    info!("Totals: {}", calculate_totals(&ranked).summary());

    // Step 4: File outputs
    info!("Step 4/4: Writing output files...");

    let csv_path = if args.csv {
        let path = write_csv(&ranked, &args.input, sort_key, &args.csv_dir)
            .context("Failed to write CSV output")?;
        info!("✓ CSV written to: {}", path.display());
        Some(path)
    } else {
        None
    };

    if let Some(json_path) = &args.json {
        let report = to_report(
            &args.input.display().to_string(),
            sort_key,
            anchor,
            &summary.stats,
            &ranked,
        );
        if let Err(err) = write_report(&report, json_path) {
            // Either both file outputs exist or neither does
            if let Some(path) = &csv_path {
                if let Err(remove_err) = std::fs::remove_file(path) {
                    warn!("Could not remove {}: {}", path.display(), remove_err);
                }
            }
            return Err(err).context("Failed to write JSON report");
        }
        info!("✓ Report written to: {}", json_path.display());
    }

    Ok(Analysis {
        sort_key,
        ranked,
        stats: summary.stats,
        limit: args.limit,
        csv_path,
    })
}

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Missing or unreadable trace file
/// * Invalid sort key or flow anchor
/// * File write errors
pub fn execute_analyze(args: AnalyzeArgs) -> Result<()> {
    let start_time = Instant::now();

    let analysis = run_analysis(&args)?;

    println!("{}", render_table(analysis.visible_rows()));
    if analysis.ranked.len() > analysis.limit {
        println!(
            "Showing {} of {} functions sorted by {}",
            analysis.limit,
            analysis.ranked.len(),
            analysis.sort_key
        );
    }

    let elapsed = start_time.elapsed();
    info!("Analysis completed in {:.2}s", elapsed.as_secs_f64());

    Ok(())
}
