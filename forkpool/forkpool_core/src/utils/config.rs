//! Configuration for the forkpool runtime.
//!
//! Handles loading runtime configuration from TOML and supplies the defaults
//! for the executor and the parallel sort.

use crate::error::ConfigError;
use crate::utils::logging::LogLevel;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Slices shorter than this are sorted sequentially by default.
pub const DEFAULT_MIN_CHUNK_SIZE: usize = 1 << 14;

/// Default fork depth for a machine with `parallelism` logical CPUs.
///
/// `2 * floor(log2(parallelism)) + 1`, which caps the fan-out at roughly
/// `2^depth` leaf units.
pub fn depth_for_parallelism(parallelism: usize) -> usize {
    let log2 = match parallelism {
        0 | 1 => 0,
        n => n.ilog2() as usize,
    };
    2 * log2 + 1
}

/// Executor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Number of worker threads; values below one are raised to one
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Number of units the queue buffers before producers block; zero makes
    /// every hand-off a rendezvous with an idle worker
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Name prefix for worker threads
    #[serde(default = "default_thread_name_prefix")]
    pub thread_name_prefix: String,

    /// Whether to collect execution statistics
    #[serde(default = "default_collect_stats")]
    pub collect_stats: bool,
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_queue_capacity() -> usize {
    // Rule of thumb: at least one slot per worker to absorb bursts.
    num_cpus::get()
}

fn default_thread_name_prefix() -> String {
    "forkpool-worker".to_string()
}

fn default_collect_stats() -> bool {
    true
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            thread_name_prefix: default_thread_name_prefix(),
            collect_stats: default_collect_stats(),
        }
    }
}

impl ExecutorConfig {
    /// Configuration with the given sizes and default naming and stats.
    pub fn new(workers: usize, queue_capacity: usize) -> Self {
        Self {
            workers,
            queue_capacity,
            ..Default::default()
        }
    }

    /// Worker count with the lower bound of one applied.
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }
}

/// Parallel sort configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    /// Maximum number of nested forks; `None` derives it from the CPU count
    #[serde(default)]
    pub depth_budget: Option<usize>,

    /// Slices shorter than this never fork
    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,
}

fn default_min_chunk_size() -> usize {
    DEFAULT_MIN_CHUNK_SIZE
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            depth_budget: None,
            min_chunk_size: default_min_chunk_size(),
        }
    }
}

impl SortConfig {
    /// The configured depth budget, or the one derived from the CPU count.
    pub fn depth_budget_or_default(&self) -> usize {
        self.depth_budget
            .unwrap_or_else(|| depth_for_parallelism(num_cpus::get()))
    }

    /// Check that the values can be honoured by the sorter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "sort.min_chunk_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Minimum level that is logged
    #[serde(default)]
    pub log_level: LogLevel,

    /// Executor settings
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Parallel sort settings
    #[serde(default)]
    pub sort: SortConfig,
}

impl RuntimeConfig {
    /// Load configuration from a file, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// A worker count of zero is not an error; the executor raises it to one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.executor.workers == 0 {
            warn!("executor.workers is 0, one worker will be started");
        }
        if self.executor.thread_name_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "executor.thread_name_prefix must not be empty".to_string(),
            ));
        }
        self.sort.validate()
    }

    /// Serialize the configuration back to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
