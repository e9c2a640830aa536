use crate::cache::CombinationCache;
use crate::conf::PolicyTreeConfig;
use crate::data::{PolicyData, ScoreMatrix};
use crate::evaluation::Capabilities;
use crate::node::{Subtree, assemble};
use crate::split::SplitEnumerator;
use std::sync::Arc;

/// Best result found for one partition.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub subtree: Subtree,
    /// Combined reward, after budget adjustment when a restriction is enforced.
    pub reward: f64,
    pub counts: Vec<usize>,
}

/// Read-only inputs shared by every recursive call and every parallel task.
pub struct SearchContext {
    pub data: Arc<PolicyData>,
    pub diffs: ScoreMatrix,
    pub enumerator: SplitEnumerator,
    pub config: PolicyTreeConfig,
    pub capabilities: Capabilities,
}

impl SearchContext {
    pub fn new(data: Arc<PolicyData>, config: PolicyTreeConfig, capabilities: Capabilities) -> Self {
        let diffs = data.scores().differences();
        let enumerator =
            SplitEnumerator::new(&data, &config, Arc::clone(&capabilities.ranking));
        Self {
            data,
            diffs,
            enumerator,
            config,
            capabilities,
        }
    }

    /// A cache holding the full-sample enumeration of every unordered covariate.
    pub fn primed_cache(&self) -> CombinationCache {
        let mut cache = CombinationCache::new(self.data.n_variables());
        self.enumerator
            .prime(&self.data, &self.diffs, &mut cache, self.config.seed);
        cache
    }
}

/// Exhaustive depth-first search over all (covariate, candidate) pairs.
///
/// Each engine owns its combination cache; engines never share mutable state.
pub struct SearchEngine<'a> {
    ctx: &'a SearchContext,
    cache: CombinationCache,
}

impl<'a> SearchEngine<'a> {
    pub fn new(ctx: &'a SearchContext, cache: CombinationCache) -> Self {
        Self { ctx, cache }
    }

    pub fn cache(&self) -> &CombinationCache {
        &self.cache
    }

    pub fn into_cache(self) -> CombinationCache {
        self.cache
    }

    /// Best tree of `depth` levels over `units`, or `None` when no split is feasible.
    pub fn search(&mut self, units: &[usize], depth: usize, seed: u64) -> Option<SearchOutcome> {
        self.search_node(units, depth, seed, false)
    }

    /// Best tree whose root splits on variable `m`.
    ///
    /// The root split only has to leave `min_leaf_size` units on each side;
    /// deeper levels apply the usual bound.
    pub fn search_variable(
        &mut self,
        m: usize,
        units: &[usize],
        depth: usize,
        seed: u64,
    ) -> Option<SearchOutcome> {
        if depth <= 1 {
            return self.search_node(units, depth, seed, false);
        }
        let min_size = self.ctx.config.min_leaf_size;
        self.best_split(std::iter::once(m), units, depth, seed, min_size, false)
    }

    fn search_node(
        &mut self,
        units: &[usize],
        depth: usize,
        seed: u64,
        no_further_splits: bool,
    ) -> Option<SearchOutcome> {
        let ctx = self.ctx;
        if depth <= 1 {
            let leaf = ctx.capabilities.leaf.evaluate(ctx.data.scores(), units);
            return Some(SearchOutcome {
                reward: leaf.reward,
                counts: leaf.counts.clone(),
                subtree: Subtree::Leaf(leaf),
            });
        }

        let mut no_further_splits = no_further_splits;
        if !no_further_splits && depth < ctx.config.depth {
            if let Some(check) = &ctx.capabilities.dominance {
                no_further_splits = check.no_further_splits(ctx.data.scores(), units);
            }
        }

        let min_size = ctx.config.min_split_size(depth);
        self.best_split(
            0..ctx.data.n_variables(),
            units,
            depth,
            seed,
            min_size,
            no_further_splits,
        )
    }

    fn best_split(
        &mut self,
        variables: impl Iterator<Item = usize>,
        units: &[usize],
        depth: usize,
        seed: u64,
        min_size: usize,
        no_further_splits: bool,
    ) -> Option<SearchOutcome> {
        let ctx = self.ctx;
        let data = ctx.data.as_ref();
        let mut best: Option<SearchOutcome> = None;

        for m in variables {
            let candidates =
                ctx.enumerator
                    .candidates(m, data, &ctx.diffs, units, &mut self.cache, seed);
            let column = data.column(m);

            for c in 0..candidates.len() {
                let (left, right): (Vec<usize>, Vec<usize>) = units
                    .iter()
                    .partition(|&&i| candidates.goes_left(c, column[i]));
                if left.len() < min_size || right.len() < min_size {
                    continue;
                }

                let Some(left_best) =
                    self.search_node(&left, depth - 1, seed.wrapping_add(1), no_further_splits)
                else {
                    continue;
                };
                let Some(right_best) =
                    self.search_node(&right, depth - 1, seed.wrapping_add(1), no_further_splits)
                else {
                    continue;
                };

                let (reward_left, reward_right) = match ctx.config.enforced_budget() {
                    Some(max_by_treat) => ctx.capabilities.adjuster.adjust(
                        &left_best.counts,
                        &right_best.counts,
                        left_best.reward,
                        right_best.reward,
                        max_by_treat,
                    ),
                    None => (left_best.reward, right_best.reward),
                };

                let reward = reward_left + reward_right;
                if best.as_ref().map_or(true, |b| reward > b.reward) {
                    let counts = left_best
                        .counts
                        .iter()
                        .zip(&right_best.counts)
                        .map(|(l, r)| l + r)
                        .collect();
                    let subtree = assemble(
                        left_best.subtree,
                        right_best.subtree,
                        &data.variables()[m],
                        m,
                        candidates.value(c),
                    );
                    best = Some(SearchOutcome {
                        subtree,
                        reward,
                        counts,
                    });
                }

                if no_further_splits {
                    return best;
                }
            }
        }
        best
    }
}
