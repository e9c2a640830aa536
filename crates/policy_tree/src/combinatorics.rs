//! Counting and subset helpers used by the candidate enumerator.
//!
//! Subsets of categorical codes are always kept sorted so that two subsets are
//! equal exactly when they induce the same left partition.

use crate::conf::MIN_SELECTED_CATEGORIES;
use itertools::Itertools;
use std::collections::HashSet;

/// Number of distinct binary partitions of `k` categories:
/// `(2^k - 2) / 2`, since the empty/full sets are excluded and a subset and
/// its complement split the units identically. Saturates at `u64::MAX`.
pub fn total_sample_splits(k: usize) -> u64 {
    match k {
        0 | 1 => 0,
        k if k > 64 => u64::MAX,
        k => (1u64 << (k - 1)) - 1,
    }
}

/// Number of categories whose full enumeration just exceeds `budget`.
///
/// Fewer than six categories are always kept whole; otherwise the smallest
/// count in `[6, k)` whose partition count is above the budget, or `k` when
/// none is.
pub fn values_for_budget(k: usize, budget: usize) -> usize {
    if k < MIN_SELECTED_CATEGORIES {
        return k;
    }
    (MIN_SELECTED_CATEGORIES..k)
        .find(|&n| total_sample_splits(n) > budget as u64)
        .unwrap_or(k)
}

/// `points` indices evenly spread over `0..n`, trimmed by half a step at both
/// ends. Neighbouring positions may repeat when `points` exceeds `n`.
pub fn spaced_positions(n: usize, points: usize) -> Vec<usize> {
    if n == 0 || points == 0 {
        return Vec::new();
    }
    let start = n as f64 / points as f64 / 2.0;
    let stop = n as f64 - 1.0 - start;
    let step = if points > 1 {
        (stop - start) / (points - 1) as f64
    } else {
        0.0
    };
    (0..points)
        .map(|i| {
            let pos = (start + step * i as f64) as i64;
            pos.clamp(0, n as i64 - 1) as usize
        })
        .collect()
}

/// Every non-trivial subset of `values`, keeping only one of each
/// complementary pair. `values` must be sorted and distinct.
///
/// Subsets are produced by increasing size in lexicographic order. For an even
/// number of values, a half-sized subset is kept only if it contains the first
/// value, which keeps the first of each pair in that order.
pub fn all_subsets_without_complements(values: &[i64]) -> Vec<Vec<i64>> {
    let k = values.len();
    if k < 2 {
        return Vec::new();
    }
    let mut out = Vec::new();
    for size in 1..=k / 2 {
        let half = 2 * size == k;
        for combo in values.iter().copied().combinations(size) {
            if half && combo[0] != values[0] {
                continue;
            }
            out.push(combo);
        }
    }
    out
}

/// Complement of a sorted `subset` within the sorted `domain`.
pub fn complement(subset: &[i64], domain: &[i64]) -> Vec<i64> {
    domain
        .iter()
        .copied()
        .filter(|v| subset.binary_search(v).is_err())
        .collect()
}

/// Removes duplicates and later complements, keeping first-seen order.
pub fn drop_complements(subsets: Vec<Vec<i64>>, domain: &[i64]) -> Vec<Vec<i64>> {
    let mut seen: HashSet<Vec<i64>> = HashSet::with_capacity(subsets.len() * 2);
    let mut out = Vec::with_capacity(subsets.len());
    for subset in subsets {
        if seen.contains(&subset) {
            continue;
        }
        seen.insert(complement(&subset, domain));
        seen.insert(subset.clone());
        out.push(subset);
    }
    out
}
