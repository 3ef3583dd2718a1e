//! Error types for the forkpool runtime.
//!
//! Each subsystem has its own error type: the executor reports submission
//! failures, tasks report their own outcome, the parallel sort reports fork
//! failures, and configuration loading reports I/O and parse problems.
//!
//! The root error type, `Error`, wraps any of them so callers that drive
//! several subsystems (the CLI, for example) can use a single `Result`.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Root error type for forkpool.
#[derive(Debug, Error)]
pub enum Error {
    /// Submission to the executor failed
    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),

    /// A unit of work reported a failure
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// The parallel sort could not complete
    #[error("Sort error: {0}")]
    Sort(#[from] SortError),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type used throughout forkpool.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a cancellation signal fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// The token was cancelled explicitly.
    Cancelled,

    /// The token's deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled"),
            Self::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// Errors returned synchronously by the submitting executor operations.
///
/// None of these are ever retried by the executor.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// No unit of work was supplied
    #[error("executor: unit of work is absent")]
    NilUnit,

    /// The executor has begun closing and accepts no new work
    #[error("executor: closed to new work")]
    Closed,

    /// The cancellation signal fired before the unit could be enqueued
    #[error("executor: submission {0}")]
    Cancelled(CancelReason),

    /// A worker thread could not be started
    #[error("executor: failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl ExecutorError {
    /// Whether this error means the executor refused work because it is closing.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Whether this error came from a cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Outcome errors of a single unit of work, observed through a `Future`.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The unit of work returned an error; displayed and sourced as-is
    #[error(transparent)]
    Failed(#[from] anyhow::Error),

    /// The unit of work panicked; the payload message is captured
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The unit of work was dropped without ever running
    #[error("task was abandoned before it ran")]
    Abandoned,
}

impl TaskError {
    /// Wrap any error reported by a unit of work.
    pub fn failed<E>(error: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::Failed(error.into())
    }

    /// Borrow the error reported by the unit of work, if it returned one.
    pub fn reported(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors from the parallel sort.
#[derive(Debug, Error)]
pub enum SortError {
    /// The sorter was configured with values it cannot honour
    #[error("invalid sort configuration: {0}")]
    InvalidConfig(String),

    /// The forked branch could not be scheduled on a new thread
    #[error("failed to fork sort branch: {0}")]
    Fork(#[source] std::io::Error),

    /// The forked branch panicked (for example inside a user `Ord` impl)
    #[error("forked sort branch panicked: {0}")]
    ForkPanicked(String),
}

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to load configuration from {}: {source}", path.display())]
    Read {
        /// Path that was being read
        path: PathBuf,

        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration parsed but holds unusable values
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Render a panic payload caught with `catch_unwind` as a message.
///
/// Payloads from `panic!("literal")` are `&str`, formatted ones are `String`;
/// anything else is reported as unknown.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<unknown panic>".to_string()
    }
}
