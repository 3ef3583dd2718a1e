//! Worker pool and completion handles.
//!
//! - A bounded-queue executor with blocking, non-blocking, cancellable and
//!   future-returning submission
//! - Futures that settle exactly once with a unit's outcome

pub mod executor;
pub mod future;

pub use executor::{Executor, ExecutorState, ExecutorStats, FallibleJob, Job};
pub use future::{Future, Outcome};
