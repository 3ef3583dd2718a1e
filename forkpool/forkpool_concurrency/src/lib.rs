#![deny(warnings)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

//! # forkpool concurrency
//!
//! The concurrency runtime of forkpool:
//!
//! - A fixed-size worker pool draining a bounded FIFO queue, with
//!   back-pressure, futures and idempotent shutdown
//! - One-shot cancellation tokens for bounded waits on a full queue
//! - A depth-governed fork-join merge sort, the workload the pool runs
//!
//! ```
//! use forkpool_concurrency::{Executor, ParallelSorter};
//!
//! let executor = Executor::new(2, 4).unwrap();
//! let sorter = ParallelSorter::new().with_min_chunk_size(2).unwrap();
//!
//! let future = sorter.submit(&executor, vec![5, 3, 1, 4, 2]).unwrap();
//! assert_eq!(future.join().unwrap(), vec![1, 2, 3, 4, 5]);
//!
//! executor.shutdown();
//! ```

/// Worker pool and futures
pub mod pool;

/// Merge sorts, sequential and fork-join
pub mod sort;

/// Synchronization primitives
pub mod sync;

// Re-export key types for easier access
pub use pool::{Executor, ExecutorState, ExecutorStats, Future};
pub use sort::{merge, merge_sort, parallel_merge_sort, ParallelSorter};
pub use sync::CancelToken;
