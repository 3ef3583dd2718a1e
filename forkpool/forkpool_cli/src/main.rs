use anyhow::Result;
use clap::{Parser, Subcommand};
use forkpool_core::utils::LogLevel;

mod commands;

use commands::compare::{execute_compare, CompareArgs};
use commands::sort::{execute_sort, SortArgs};

/// forkpool benchmarking harness
///
/// Generates a seeded integer array and sorts it sequentially, with the
/// fork-join sort, or with the fork-join sort running on the worker pool.
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[clap(long, global = true)]
    log_level: Option<LogLevel>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sort a generated array with one strategy
    Sort(SortArgs),

    /// Sort the same array with every strategy and compare the results
    Compare(CompareArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sort(args) => execute_sort(&args, cli.log_level),
        Commands::Compare(args) => execute_compare(&args, cli.log_level),
    }
}
