//! Property tests for the merge sorts.

use std::cmp::Ordering;

use forkpool_concurrency::{merge, merge_sort, parallel_merge_sort, Executor, ParallelSorter};
use forkpool_core::generate::generate;
use proptest::prelude::*;

/// Orders by `key` only; `tag` records the original position.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Tagged {
    key: i8,
    tag: usize,
}

impl Ord for Tagged {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl PartialOrd for Tagged {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn is_sorted<T: Ord>(data: &[T]) -> bool {
    data.windows(2).all(|w| w[0] <= w[1])
}

fn sorter(min_chunk_size: usize) -> ParallelSorter {
    ParallelSorter::new()
        .with_min_chunk_size(min_chunk_size)
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn merge_of_sorted_inputs_is_sorted_permutation(
        mut left in prop::collection::vec(any::<i32>(), 0..64),
        mut right in prop::collection::vec(any::<i32>(), 0..64),
    ) {
        left.sort();
        right.sort();

        let merged = merge(&left, &right);
        prop_assert!(is_sorted(&merged));

        let mut expected = [left, right].concat();
        expected.sort();
        prop_assert_eq!(merged, expected);
    }

    #[test]
    fn sequential_sort_matches_std(data in prop::collection::vec(any::<i64>(), 0..300)) {
        let sorted = merge_sort(&data);
        let mut expected = data.clone();
        expected.sort();
        prop_assert_eq!(sorted, expected);
    }

    #[test]
    fn parallel_sort_is_sorted_permutation(
        data in prop::collection::vec(-50i64..50, 0..300),
        depth in 0usize..6,
        min_chunk in 1usize..16,
    ) {
        let sorted = sorter(min_chunk).sort_with_depth(&data, depth).unwrap();
        prop_assert!(is_sorted(&sorted));

        let mut expected = data.clone();
        expected.sort();
        prop_assert_eq!(sorted, expected);
    }

    #[test]
    fn depth_does_not_change_output(
        keys in prop::collection::vec(-4i8..4, 0..200),
        depth in 0usize..6,
    ) {
        let data: Vec<Tagged> = keys
            .into_iter()
            .enumerate()
            .map(|(tag, key)| Tagged { key, tag })
            .collect();

        let sequential = merge_sort(&data);
        let parallel = sorter(2).sort_with_depth(&data, depth).unwrap();

        // Equal keys keep their input order on both paths.
        let tags = |v: &[Tagged]| v.iter().map(|t| t.tag).collect::<Vec<_>>();
        prop_assert_eq!(tags(&parallel), tags(&sequential));

        let mut stable = data.clone();
        stable.sort_by_key(|t| t.key);
        prop_assert_eq!(tags(&parallel), tags(&stable));
    }
}

#[test]
fn test_small_example_every_depth() {
    for depth in 0..=3 {
        let sorted = sorter(1)
            .sort_with_depth(&[5, 3, 1, 4, 2], depth)
            .unwrap();
        assert_eq!(sorted, vec![1, 2, 3, 4, 5]);
    }
}

#[test]
fn test_million_elements_on_executor() {
    let executor = Executor::new(2, 1).unwrap();
    let data = generate(1_000_000, 42);
    let expected = merge_sort(&data);

    let future = ParallelSorter::new()
        .with_depth_budget(4)
        .submit(&executor, data)
        .unwrap();
    let sorted = future.join().unwrap();

    assert_eq!(sorted.len(), 1_000_000);
    assert!(is_sorted(&sorted));
    assert_eq!(sorted, expected);

    executor.shutdown();
}

#[test]
fn test_free_function_matches_sorter() {
    let data = generate(50_000, 9);
    assert_eq!(
        parallel_merge_sort(&data, 3).unwrap(),
        ParallelSorter::new().sort_with_depth(&data, 3).unwrap()
    );
}
