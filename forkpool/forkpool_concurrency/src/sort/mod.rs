//! Merge sorts used as the representative workload.
//!
//! - Sequential merge sort, the reference every other path must match
//! - Fork-join parallel merge sort with a depth budget and a sequential cutover

pub mod merge;
pub mod parallel;

pub use merge::{merge, merge_sort};
pub use parallel::{parallel_merge_sort, ParallelSorter};
