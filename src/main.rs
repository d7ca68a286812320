//! Xdebug Trace Studio CLI
//!
//! Turns an Xdebug function trace into a per-function performance table.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use xdebug_trace_studio::commands::{
    display_version, execute_analyze, validate_args, validate_report_file, AnalyzeArgs,
};
use xdebug_trace_studio::utils::config::{DEFAULT_RESULT_LIMIT, ENV_RESULT_LIMIT, ENV_SORT_KEY};

/// Xdebug Trace Studio - per-function reports for Xdebug traces
#[derive(Parser, Debug)]
#[command(name = "xdebug-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Aggregate a trace file and print the per-function table
    Analyze {
        /// Path to the Xdebug trace (.xt) file
        #[arg(short, long)]
        file: PathBuf,

        /// Sort key [flow, calls, time, memory]
        #[arg(short, long, default_value = "flow", env = ENV_SORT_KEY)]
        sort_key: String,

        /// Number of rows printed
        #[arg(short, long, default_value_t = DEFAULT_RESULT_LIMIT, env = ENV_RESULT_LIMIT)]
        limit: usize,

        /// Also write all rows to <trace>.sorted_by_<key>.csv
        #[arg(long)]
        csv: bool,

        /// Directory for the CSV file
        #[arg(long, default_value = ".")]
        csv_dir: PathBuf,

        /// Output path for a JSON report (optional)
        #[arg(long)]
        json: Option<PathBuf>,

        /// Which call sets a function's flow position [first, last]
        #[arg(long, default_value = "first")]
        flow_anchor: String,
    },

    /// Validate a JSON report file
    Validate {
        /// Path to report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Analyze {
            file,
            sort_key,
            limit,
            csv,
            csv_dir,
            json,
            flow_anchor,
        } => {
            let args = AnalyzeArgs {
                input: file,
                sort_key,
                limit,
                csv,
                csv_dir,
                json,
                flow_anchor,
            };

            // Validate args first
            validate_args(&args)?;

            execute_analyze(args)?;
        }

        Commands::Validate { file } => {
            validate_report_file(file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
