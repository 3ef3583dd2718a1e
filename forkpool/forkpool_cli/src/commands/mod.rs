//! Subcommands of the forkpool CLI.
//!
//! Both subcommands share [`RunArgs`]: input generation, configuration
//! loading with flag overrides, and logger setup.

pub mod compare;
pub mod sort;

use anyhow::Result;
use clap::{Args, ValueEnum};
use forkpool_concurrency::{merge_sort, Executor, ParallelSorter};
use forkpool_core::generate::generate;
use forkpool_core::utils::{LogLevel, RuntimeConfig};
use log::{debug, info};
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// How the generated array is sorted
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Single-threaded merge sort
    Sequential,

    /// Fork-join merge sort on scoped threads
    Parallel,

    /// Fork-join merge sort submitted as one unit to the worker pool
    Executor,
}

impl Strategy {
    /// Every strategy, in reporting order.
    pub const ALL: [Strategy; 3] = [Strategy::Sequential, Strategy::Parallel, Strategy::Executor];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
            Self::Executor => "executor",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Number of elements to generate
    #[clap(long, default_value_t = 1_000_000)]
    pub size: usize,

    /// Seed for the input generator
    #[clap(long, default_value_t = 42)]
    pub seed: u64,

    /// Fork depth budget for the parallel sort
    #[clap(long)]
    pub depth: Option<usize>,

    /// Slices shorter than this are sorted sequentially
    #[clap(long)]
    pub min_chunk: Option<usize>,

    /// Worker threads in the pool
    #[clap(long)]
    pub workers: Option<usize>,

    /// Queue capacity of the pool
    #[clap(long)]
    pub queue: Option<usize>,

    /// TOML configuration file
    #[clap(long)]
    pub config: Option<PathBuf>,
}

impl RunArgs {
    /// Load the configuration file, apply flag overrides and install the logger.
    pub fn prepare(&self, log_level: Option<LogLevel>) -> Result<RuntimeConfig> {
        let mut config = RuntimeConfig::load(self.config.as_deref())?;

        if let Some(workers) = self.workers {
            config.executor.workers = workers;
        }
        if let Some(queue) = self.queue {
            config.executor.queue_capacity = queue;
        }
        if let Some(depth) = self.depth {
            config.sort.depth_budget = Some(depth);
        }
        if let Some(min_chunk) = self.min_chunk {
            config.sort.min_chunk_size = min_chunk;
        }
        config.validate()?;

        init_logging(log_level.unwrap_or(config.log_level));
        debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    /// Generate the input array.
    pub fn generate(&self) -> Vec<i64> {
        info!("Generating {} elements with seed {}", self.size, self.seed);
        generate(self.size, self.seed)
    }
}

/// `RUST_LOG`, when set, takes precedence over `level`.
fn init_logging(level: LogLevel) {
    let _ = env_logger::Builder::new()
        .filter_level(level.to_level_filter())
        .parse_default_env()
        .try_init();
}

/// Sort `data` with `strategy` and time it.
pub fn run_strategy(
    strategy: Strategy,
    data: &[i64],
    config: &RuntimeConfig,
) -> forkpool_core::Result<(Vec<i64>, Duration)> {
    let sorter = ParallelSorter::with_config(&config.sort)?;
    let start = Instant::now();

    let sorted = match strategy {
        Strategy::Sequential => merge_sort(data),
        Strategy::Parallel => sorter.sort(data)?,
        Strategy::Executor => {
            let executor = Executor::with_config(config.executor.clone())?;
            let outcome = sorter.submit(&executor, data.to_vec())?.join();
            executor.shutdown();
            outcome?
        }
    };

    let elapsed = start.elapsed();
    info!("{} sort finished in {:?}", strategy, elapsed);
    Ok((sorted, elapsed))
}

/// Whether `data` is in non-decreasing order.
pub fn is_sorted(data: &[i64]) -> bool {
    data.windows(2).all(|w| w[0] <= w[1])
}
