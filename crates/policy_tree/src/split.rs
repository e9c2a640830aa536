use crate::cache::{CombinationCache, SubsetList};
use crate::combinatorics::{
    all_subsets_without_complements, drop_complements, spaced_positions,
    total_sample_splits, values_for_budget,
};
use crate::conf::{PolicyTreeConfig, THRESHOLD_EPSILON};
use crate::data::{PolicyData, ScoreMatrix, VariableKind, sorted_distinct};
use crate::evaluation::CategoryRanking;
use core::fmt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// The value a node splits on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SplitValue {
    /// Units with `x <= threshold` go left.
    Threshold(f64),
    /// Units whose category is in the (sorted) set go left.
    Categories(Vec<i64>),
}

impl SplitValue {
    #[inline]
    pub fn goes_left(&self, x: f64) -> bool {
        match self {
            SplitValue::Threshold(t) => x <= t + THRESHOLD_EPSILON,
            SplitValue::Categories(subset) => subset.binary_search(&(x as i64)).is_ok(),
        }
    }
}

impl fmt::Display for SplitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitValue::Threshold(t) => write!(f, "<= {}", t),
            SplitValue::Categories(subset) => write!(f, "in {:?}", subset),
        }
    }
}

/// Split candidates of one covariate at one node.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidates {
    Thresholds(Vec<f64>),
    Subsets(SubsetList),
}

impl Candidates {
    pub fn len(&self) -> usize {
        match self {
            Candidates::Thresholds(t) => t.len(),
            Candidates::Subsets(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a unit with covariate value `x` falls left of candidate `i`.
    #[inline]
    pub fn goes_left(&self, i: usize, x: f64) -> bool {
        match self {
            Candidates::Thresholds(t) => x <= t[i] + THRESHOLD_EPSILON,
            Candidates::Subsets(s) => s[i].binary_search(&(x as i64)).is_ok(),
        }
    }

    pub fn value(&self, i: usize) -> SplitValue {
        match self {
            Candidates::Thresholds(t) => SplitValue::Threshold(t[i]),
            Candidates::Subsets(s) => SplitValue::Categories(s[i].clone()),
        }
    }
}

/// Produces split candidates per covariate and partition.
///
/// Evaluation grids of ordered covariates are built once from their global
/// domains; unordered covariates are enumerated lazily through the cache.
#[derive(Clone)]
pub struct SplitEnumerator {
    kinds: Vec<VariableKind>,
    grids: Vec<Vec<f64>>,
    categorical_budget: usize,
    select_values: bool,
    ranking: Arc<dyn CategoryRanking>,
}

impl SplitEnumerator {
    pub fn new(
        data: &PolicyData,
        config: &PolicyTreeConfig,
        ranking: Arc<dyn CategoryRanking>,
    ) -> Self {
        let kinds: Vec<VariableKind> = data.variables().iter().map(|v| v.kind).collect();
        let grids = data
            .variables()
            .iter()
            .map(|v| match v.kind {
                VariableKind::Continuous => evaluation_grid(&v.values, config.no_of_evalupoints),
                VariableKind::Discrete => v.values.clone(),
                VariableKind::Unordered => Vec::new(),
            })
            .collect();
        Self {
            kinds,
            grids,
            categorical_budget: config.categorical_budget(),
            select_values: config.select_values_cat,
            ranking,
        }
    }

    pub fn candidates(
        &self,
        m: usize,
        data: &PolicyData,
        diffs: &ScoreMatrix,
        units: &[usize],
        cache: &mut CombinationCache,
        seed: u64,
    ) -> Candidates {
        let column = data.column(m);
        if self.kinds[m].is_ordered() {
            let local: Vec<f64> = units.iter().map(|&i| column[i]).collect();
            return Candidates::Thresholds(ordered_candidates(&self.grids[m], &local));
        }
        let values = distinct_codes(column, units);
        let subsets = cache.get_or_insert_with(m, &values, || {
            categorical_candidates(
                &values,
                column,
                diffs,
                units,
                self.categorical_budget,
                self.select_values,
                self.ranking.as_ref(),
                seed,
            )
        });
        Candidates::Subsets(subsets)
    }

    /// Enumerates the full-sample value set of every unordered covariate.
    pub fn prime(
        &self,
        data: &PolicyData,
        diffs: &ScoreMatrix,
        cache: &mut CombinationCache,
        seed: u64,
    ) {
        let units: Vec<usize> = (0..data.n_units()).collect();
        for (m, kind) in self.kinds.iter().enumerate() {
            if !kind.is_ordered() {
                self.candidates(m, data, diffs, &units, cache, seed);
            }
        }
    }
}

/// Thinned grid over a sorted continuous domain with exactly `points` entries
/// (fewer only for an empty domain). Repeats are kept: the grid length decides
/// when a partition falls back to its own values.
pub fn evaluation_grid(domain: &[f64], points: usize) -> Vec<f64> {
    spaced_positions(domain.len(), points)
        .into_iter()
        .map(|i| domain[i])
        .collect()
}

/// Thresholds to try for an ordered covariate given the partition's values.
///
/// `grid` is sorted and may hold repeats; they count towards both size tests
/// but the returned thresholds are distinct.
pub fn ordered_candidates(grid: &[f64], local: &[f64]) -> Vec<f64> {
    if local.is_empty() {
        return Vec::new();
    }
    if (local.len() as f64) < grid.len() as f64 / 2.0 {
        return sorted_distinct(local);
    }
    let (min, max) = local
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    let mut inside: Vec<f64> = grid
        .iter()
        .copied()
        .filter(|&g| g >= min && g < max)
        .collect();
    if inside.len() < 2 {
        return vec![min + (max - min) / 2.0];
    }
    if (local.len() as f64) < inside.len() as f64 / 2.0 {
        return sorted_distinct(local);
    }
    inside.dedup();
    inside
}

/// Sorted distinct category codes of `units`.
pub fn distinct_codes(column: &[f64], units: &[usize]) -> Vec<i64> {
    let mut codes: Vec<i64> = units.iter().map(|&i| column[i] as i64).collect();
    codes.sort_unstable();
    codes.dedup();
    codes
}

/// Category subsets to try as the left side of an unordered split.
#[allow(clippy::too_many_arguments)]
pub fn categorical_candidates(
    values: &[i64],
    column: &[f64],
    diffs: &ScoreMatrix,
    units: &[usize],
    budget: usize,
    select_values: bool,
    ranking: &dyn CategoryRanking,
    seed: u64,
) -> Vec<Vec<i64>> {
    let k = values.len();
    if total_sample_splits(k) < budget as u64 {
        return all_subsets_without_complements(values);
    }
    let mut rng = StdRng::seed_from_u64(seed);
    if select_values {
        let n = values_for_budget(k, budget).min(k);
        let mut chosen: Vec<i64> = index::sample(&mut rng, k, n)
            .into_vec()
            .into_iter()
            .map(|i| values[i])
            .collect();
        chosen.sort_unstable();
        return all_subsets_without_complements(&chosen);
    }

    let orderings = ranking.rank(column, diffs, units, values);
    let prefixes: Vec<Vec<i64>> = orderings
        .iter()
        .flat_map(|order| {
            (1..order.len()).map(move |len| {
                let mut prefix = order[..len].to_vec();
                prefix.sort_unstable();
                prefix
            })
        })
        .collect();
    let mut subsets = drop_complements(prefixes, values);

    if subsets.len() > budget {
        subsets = index::sample(&mut rng, subsets.len(), budget)
            .into_vec()
            .into_iter()
            .map(|i| subsets[i].clone())
            .collect();
    } else if subsets.len() < budget {
        pad_with_singletons(&mut subsets, orderings.first(), values, budget);
    }
    subsets
}

/// Appends singleton subsets of the top-ranked categories (at most half of them).
fn pad_with_singletons(
    subsets: &mut Vec<Vec<i64>>,
    ranked: Option<&Vec<i64>>,
    values: &[i64],
    budget: usize,
) {
    let Some(ranked) = ranked else { return };
    if values.len() < 3 {
        return;
    }
    let mut seen: HashSet<Vec<i64>> = subsets.iter().cloned().collect();
    let to_add = (budget - subsets.len()).min(values.len() / 2);
    let mut added = 0;
    for &v in ranked {
        if added == to_add {
            break;
        }
        let single = vec![v];
        let complement: Vec<i64> = values.iter().copied().filter(|x| *x != v).collect();
        if seen.contains(&single) || seen.contains(&complement) {
            continue;
        }
        seen.insert(single.clone());
        subsets.push(single);
        added += 1;
    }
}
