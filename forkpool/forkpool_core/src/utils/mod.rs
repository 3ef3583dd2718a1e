//! Utility modules shared by the forkpool crates.

pub mod config;
pub mod logging;

pub use config::{
    depth_for_parallelism, ExecutorConfig, RuntimeConfig, SortConfig, DEFAULT_MIN_CHUNK_SIZE,
};
pub use logging::LogLevel;
