//! The `sort` subcommand.

use super::{is_sorted, run_strategy, RunArgs, Strategy};
use anyhow::{bail, Result};
use clap::Args;
use forkpool_core::utils::LogLevel;

/// Arguments for the sort command
#[derive(Args, Debug, Clone)]
pub struct SortArgs {
    #[clap(flatten)]
    pub run: RunArgs,

    /// Sorting strategy
    #[clap(long, value_enum, default_value_t = Strategy::Sequential)]
    pub strategy: Strategy,
}

/// Implementation of the sort command
pub fn execute_sort(args: &SortArgs, log_level: Option<LogLevel>) -> Result<()> {
    let config = args.run.prepare(log_level)?;
    let data = args.run.generate();

    let (sorted, elapsed) = run_strategy(args.strategy, &data, &config)?;

    println!(
        "Sorted {} elements with the {} strategy in {:?}",
        sorted.len(),
        args.strategy,
        elapsed
    );
    match (sorted.first(), sorted.last()) {
        (Some(first), Some(last)) => println!("First: {}, last: {}", first, last),
        _ => println!("Input was empty"),
    }

    if !is_sorted(&sorted) {
        bail!("{} strategy produced an unsorted result", args.strategy);
    }
    Ok(())
}
