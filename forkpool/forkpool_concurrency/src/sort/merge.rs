//! Sequential merge sort.
//!
//! Ties are always resolved in favour of the left input: the right head is
//! taken only when it is strictly smaller. Every sort in this crate merges
//! with this rule, so the sequential and parallel sorts are stable and
//! produce identical output for any split depth.

/// Merge two ascending slices into one ascending vector.
///
/// Preserves multiplicity; runs in `O(n + m)` time and allocates only the
/// output.
pub fn merge<T: Ord + Clone>(left: &[T], right: &[T]) -> Vec<T> {
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let (mut i, mut j) = (0, 0);

    while i < left.len() && j < right.len() {
        if right[j] < left[i] {
            merged.push(right[j].clone());
            j += 1;
        } else {
            merged.push(left[i].clone());
            i += 1;
        }
    }

    merged.extend_from_slice(&left[i..]);
    merged.extend_from_slice(&right[j..]);
    merged
}

/// Sort by recursive halving and [`merge`]. The input is left untouched.
pub fn merge_sort<T: Ord + Clone>(data: &[T]) -> Vec<T> {
    if data.len() <= 1 {
        return data.to_vec();
    }

    let mid = data.len() / 2;
    let left = merge_sort(&data[..mid]);
    let right = merge_sort(&data[mid..]);
    merge(&left, &right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    /// Orders by `key` only, so `tag` exposes which equal element came first.
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Keyed {
        key: u8,
        tag: usize,
    }

    impl Ord for Keyed {
        fn cmp(&self, other: &Self) -> Ordering {
            self.key.cmp(&other.key)
        }
    }

    impl PartialOrd for Keyed {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }

    #[test]
    fn test_merge_interleaves() {
        assert_eq!(merge(&[1, 3, 5], &[2, 4, 6]), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_merge_with_empty_side() {
        assert_eq!(merge(&[] as &[i32], &[1, 2]), vec![1, 2]);
        assert_eq!(merge(&[1, 2], &[]), vec![1, 2]);
        assert!(merge::<i32>(&[], &[]).is_empty());
    }

    #[test]
    fn test_merge_keeps_duplicates() {
        assert_eq!(merge(&[1, 2, 2], &[2, 3]), vec![1, 2, 2, 2, 3]);
    }

    #[test]
    fn test_merge_prefers_left_on_ties() {
        let left = [Keyed { key: 1, tag: 0 }, Keyed { key: 2, tag: 1 }];
        let right = [Keyed { key: 1, tag: 2 }, Keyed { key: 2, tag: 3 }];

        let tags: Vec<usize> = merge(&left, &right).iter().map(|k| k.tag).collect();
        assert_eq!(tags, vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_merge_sort_basic() {
        assert_eq!(merge_sort(&[5, 3, 1, 4, 2]), vec![1, 2, 3, 4, 5]);
        assert_eq!(merge_sort::<i32>(&[]), Vec::<i32>::new());
        assert_eq!(merge_sort(&[9]), vec![9]);
        assert_eq!(merge_sort(&[-3, 7, -3, 0]), vec![-3, -3, 0, 7]);
    }

    #[test]
    fn test_merge_sort_leaves_input_untouched() {
        let input = vec![3, 1, 2];
        let sorted = merge_sort(&input);
        assert_eq!(input, vec![3, 1, 2]);
        assert_eq!(sorted, vec![1, 2, 3]);
    }

    #[test]
    fn test_merge_sort_is_stable() {
        let input: Vec<Keyed> = [3u8, 1, 3, 2, 1, 3]
            .iter()
            .enumerate()
            .map(|(tag, &key)| Keyed { key, tag })
            .collect();

        let tags: Vec<usize> = merge_sort(&input).iter().map(|k| k.tag).collect();
        assert_eq!(tags, vec![1, 4, 3, 0, 2, 5]);
    }
}
