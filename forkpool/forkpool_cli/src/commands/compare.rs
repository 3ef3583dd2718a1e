//! The `compare` subcommand.

use super::{is_sorted, run_strategy, RunArgs, Strategy};
use anyhow::{bail, Result};
use clap::Args;
use forkpool_core::utils::LogLevel;

/// Arguments for the compare command
#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[clap(flatten)]
    pub run: RunArgs,
}

/// Implementation of the compare command
pub fn execute_compare(args: &CompareArgs, log_level: Option<LogLevel>) -> Result<()> {
    let config = args.run.prepare(log_level)?;
    let data = args.run.generate();

    println!("Sorting {} elements (seed {})", data.len(), args.run.seed);

    let mut outputs = Vec::with_capacity(Strategy::ALL.len());
    for strategy in Strategy::ALL {
        let (sorted, elapsed) = run_strategy(strategy, &data, &config)?;
        println!("  {:<12}{:?}", strategy.to_string(), elapsed);

        if !is_sorted(&sorted) {
            bail!("{} strategy produced an unsorted result", strategy);
        }
        outputs.push(sorted);
    }

    if !outputs.windows(2).all(|w| w[0] == w[1]) {
        bail!("strategies produced different outputs");
    }
    println!("Outputs identical: yes");
    Ok(())
}
