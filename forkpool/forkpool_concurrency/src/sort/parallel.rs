//! Depth-governed fork-join merge sort.
//!
//! Each frame splits its slice at the midpoint, forks the left half onto a
//! scoped thread, sorts the right half inline and joins the fork before
//! merging. The depth budget drops by one per level; a frame with no budget
//! left, or with fewer than `min_chunk_size` elements, sorts sequentially.
//! At most `2^depth` leaf frames exist, so thread creation stays bounded
//! regardless of input size.

use crate::pool::executor::Executor;
use crate::pool::future::Future;
use crate::sort::merge::{merge, merge_sort};
use forkpool_core::error::{panic_message, ExecutorError, SortError};
use forkpool_core::utils::config::{SortConfig, DEFAULT_MIN_CHUNK_SIZE};
use log::{debug, trace};
use std::thread;

/// Fork-join merge sort with a bounded fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelSorter {
    depth_budget: usize,
    min_chunk_size: usize,
}

impl ParallelSorter {
    /// Sorter with the default chunk size and a depth derived from the CPU count.
    pub fn new() -> Self {
        Self {
            depth_budget: SortConfig::default().depth_budget_or_default(),
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
        }
    }

    /// Sorter from configuration. Rejects a zero `min_chunk_size`.
    pub fn with_config(config: &SortConfig) -> Result<Self, SortError> {
        config
            .validate()
            .map_err(|e| SortError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            depth_budget: config.depth_budget_or_default(),
            min_chunk_size: config.min_chunk_size,
        })
    }

    /// Replace the default depth budget.
    pub fn with_depth_budget(mut self, depth_budget: usize) -> Self {
        self.depth_budget = depth_budget;
        self
    }

    /// Replace the sequential cutover threshold. Rejects zero.
    pub fn with_min_chunk_size(mut self, min_chunk_size: usize) -> Result<Self, SortError> {
        if min_chunk_size == 0 {
            return Err(SortError::InvalidConfig(
                "min_chunk_size must be at least 1".to_string(),
            ));
        }
        self.min_chunk_size = min_chunk_size;
        Ok(self)
    }

    /// The depth budget used by [`ParallelSorter::sort`].
    pub fn depth_budget(&self) -> usize {
        self.depth_budget
    }

    /// Slices shorter than this are sorted sequentially.
    pub fn min_chunk_size(&self) -> usize {
        self.min_chunk_size
    }

    /// Sort with the configured depth budget.
    pub fn sort<T>(&self, data: &[T]) -> Result<Vec<T>, SortError>
    where
        T: Ord + Clone + Send + Sync,
    {
        self.sort_with_depth(data, self.depth_budget)
    }

    /// Sort with an explicit depth budget.
    ///
    /// The result is identical to [`merge_sort`] for every budget; the budget
    /// only changes how much of the work runs concurrently.
    pub fn sort_with_depth<T>(
        &self,
        data: &[T],
        depth_budget: usize,
    ) -> Result<Vec<T>, SortError>
    where
        T: Ord + Clone + Send + Sync,
    {
        debug!(
            "Sorting {} elements (depth budget {}, min chunk {})",
            data.len(),
            depth_budget,
            self.min_chunk_size
        );
        sort_frame(data, depth_budget, self.min_chunk_size)
    }

    /// Run a whole sort as one unit of work on `executor`.
    ///
    /// The forks of the sort run on their own scoped threads, not on the
    /// executor's queue, so this cannot deadlock a small pool.
    pub fn submit<T>(
        &self,
        executor: &Executor,
        data: Vec<T>,
    ) -> Result<Future<Vec<T>>, ExecutorError>
    where
        T: Ord + Clone + Send + Sync + 'static,
    {
        let sorter = *self;
        executor.submit(move || sorter.sort(&data))
    }
}

impl Default for ParallelSorter {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort `data` with the default [`ParallelSorter`] and an explicit depth budget.
pub fn parallel_merge_sort<T>(data: &[T], depth_budget: usize) -> Result<Vec<T>, SortError>
where
    T: Ord + Clone + Send + Sync,
{
    ParallelSorter::new().sort_with_depth(data, depth_budget)
}

fn sort_frame<T>(data: &[T], depth: usize, min_chunk_size: usize) -> Result<Vec<T>, SortError>
where
    T: Ord + Clone + Send + Sync,
{
    if data.len() <= 1 {
        return Ok(data.to_vec());
    }
    if data.len() < min_chunk_size || depth == 0 {
        return Ok(merge_sort(data));
    }

    let (left, right) = data.split_at(data.len() / 2);
    trace!(
        "Forking {} elements at depth {}, {} inline",
        left.len(),
        depth,
        right.len()
    );

    thread::scope(|scope| {
        let forked = thread::Builder::new()
            .name(format!("forkpool-sort-{}", depth))
            .spawn_scoped(scope, move || sort_frame(left, depth - 1, min_chunk_size))
            .map_err(SortError::Fork)?;

        let right_sorted = sort_frame(right, depth - 1, min_chunk_size);
        // Joined before either result is inspected.
        let left_sorted = forked
            .join()
            .map_err(|payload| SortError::ForkPanicked(panic_message(payload.as_ref())))?;

        Ok(merge(&left_sorted?, &right_sorted?))
    })
}
