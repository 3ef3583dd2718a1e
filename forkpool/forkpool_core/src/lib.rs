#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

//! # forkpool core
//!
//! `forkpool_core` holds the pieces shared by every forkpool crate: the error
//! hierarchy, runtime configuration, log level handling and the deterministic
//! input generator used by the benchmarks.
//!
//! ## Crate Structure
//!
//! - **error**: Error types for the executor, tasks, the sort and configuration
//! - **utils**: Configuration and logging helpers
//! - **generate**: Seeded integer sequences for benchmark inputs

pub mod error;
pub mod generate;
pub mod utils;

pub use error::{
    CancelReason, ConfigError, Error, ExecutorError, Result, SortError, TaskError,
};
pub use generate::generate;
pub use utils::{ExecutorConfig, LogLevel, RuntimeConfig, SortConfig};
