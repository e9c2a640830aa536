//! Pluggable scoring capabilities used by the search engine.
//!
//! The search never inspects scores directly except through these traits, so
//! callers can swap the leaf objective, the budget penalty, the early-exit rule
//! or the category ranking without touching the enumeration itself.

use crate::conf::PolicyTreeConfig;
use crate::data::ScoreMatrix;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Result of evaluating a single leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafOutcome {
    pub arm: usize,
    pub reward: f64,
    /// Units per arm; only `counts[arm]` is non-zero for a single-arm leaf.
    pub counts: Vec<usize>,
}

/// Chooses the arm and reward of a terminal leaf.
pub trait LeafEvaluator: Send + Sync {
    fn evaluate(&self, scores: &ScoreMatrix, units: &[usize]) -> LeafOutcome;
}

/// Penalizes child rewards when the combined allocation exceeds a per-arm budget.
pub trait RewardAdjuster: Send + Sync {
    fn adjust(
        &self,
        left_counts: &[usize],
        right_counts: &[usize],
        left_reward: f64,
        right_reward: f64,
        max_by_treat: &[f64],
    ) -> (f64, f64);
}

/// Decides whether further splits of a partition can no longer change its reward.
pub trait DominanceCheck: Send + Sync {
    fn no_further_splits(&self, scores: &ScoreMatrix, units: &[usize]) -> bool;
}

/// Orders the categories of a partition, once per score-difference column.
pub trait CategoryRanking: Send + Sync {
    fn rank(
        &self,
        column: &[f64],
        diffs: &ScoreMatrix,
        units: &[usize],
        values: &[i64],
    ) -> Vec<Vec<i64>>;
}

#[inline]
fn cost(costs: &Option<Vec<f64>>, arm: usize) -> f64 {
    costs.as_ref().map_or(0.0, |c| c[arm])
}

/// Assigns the arm with the largest total (cost-adjusted) score.
#[derive(Debug, Clone, Default)]
pub struct BestArmLeaf {
    pub costs: Option<Vec<f64>>,
}

impl LeafEvaluator for BestArmLeaf {
    fn evaluate(&self, scores: &ScoreMatrix, units: &[usize]) -> LeafOutcome {
        let n_arms = scores.n_arms();
        let mut totals = vec![0.0; n_arms];
        for &i in units {
            for (arm, total) in totals.iter_mut().enumerate() {
                *total += scores.get(i, arm) - cost(&self.costs, arm);
            }
        }
        let (arm, reward) = totals
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (arm, total)| {
                if total > best.1 { (arm, total) } else { best }
            });
        let mut counts = vec![0; n_arms];
        counts[arm] = units.len();
        LeafOutcome {
            arm,
            reward: if units.is_empty() { 0.0 } else { reward },
            counts,
        }
    }
}

/// Shrinks both rewards by the largest relative budget overshoot, capped at 100%.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProportionalPenalty;

impl RewardAdjuster for ProportionalPenalty {
    fn adjust(
        &self,
        left_counts: &[usize],
        right_counts: &[usize],
        left_reward: f64,
        right_reward: f64,
        max_by_treat: &[f64],
    ) -> (f64, f64) {
        let overshoot = left_counts
            .iter()
            .zip(right_counts)
            .zip(max_by_treat)
            .map(|((l, r), budget)| ((l + r) as f64 - budget) / budget)
            .filter(|share| *share > 0.0)
            .fold(0.0_f64, f64::max);
        if overshoot <= 0.0 {
            return (left_reward, right_reward);
        }
        let share = overshoot.min(1.0);
        (
            left_reward - share * left_reward.abs(),
            right_reward - share * right_reward.abs(),
        )
    }
}

/// No further split matters when one arm is best for every unit.
#[derive(Debug, Clone, Default)]
pub struct UniformBestArm {
    pub costs: Option<Vec<f64>>,
}

impl UniformBestArm {
    fn best_arm(&self, row: &[f64]) -> usize {
        let mut best = 0;
        let mut best_value = f64::NEG_INFINITY;
        for (arm, score) in row.iter().enumerate() {
            let value = score - cost(&self.costs, arm);
            if value > best_value {
                best = arm;
                best_value = value;
            }
        }
        best
    }
}

impl DominanceCheck for UniformBestArm {
    fn no_further_splits(&self, scores: &ScoreMatrix, units: &[usize]) -> bool {
        let mut arms = units.iter().map(|&i| self.best_arm(scores.row(i)));
        match arms.next() {
            Some(first) => arms.all(|arm| arm == first),
            None => true,
        }
    }
}

/// Sorts categories by the mean score difference of their units, ascending.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanDifferenceRanking;

impl CategoryRanking for MeanDifferenceRanking {
    fn rank(
        &self,
        column: &[f64],
        diffs: &ScoreMatrix,
        units: &[usize],
        values: &[i64],
    ) -> Vec<Vec<i64>> {
        if diffs.n_arms() == 0 {
            return vec![values.to_vec()];
        }
        let position: HashMap<i64, usize> =
            values.iter().enumerate().map(|(p, v)| (*v, p)).collect();
        let mut sums = vec![vec![0.0; values.len()]; diffs.n_arms()];
        let mut counts = vec![0usize; values.len()];
        for &i in units {
            let Some(&p) = position.get(&(column[i] as i64)) else {
                continue;
            };
            counts[p] += 1;
            for (j, d) in diffs.row(i).iter().enumerate() {
                sums[j][p] += d;
            }
        }
        sums.iter()
            .map(|sum| {
                let mut order: Vec<(i64, f64)> = values
                    .iter()
                    .zip(sum.iter().zip(&counts))
                    .map(|(v, (s, n))| (*v, if *n > 0 { s / *n as f64 } else { 0.0 }))
                    .collect();
                order.sort_by(|a, b| a.1.total_cmp(&b.1));
                order.into_iter().map(|(v, _)| v).collect()
            })
            .collect()
    }
}

/// The set of capabilities one search runs with.
#[derive(Clone)]
pub struct Capabilities {
    pub leaf: Arc<dyn LeafEvaluator>,
    pub adjuster: Arc<dyn RewardAdjuster>,
    /// Early exit is disabled when `None`.
    pub dominance: Option<Arc<dyn DominanceCheck>>,
    pub ranking: Arc<dyn CategoryRanking>,
}

impl Capabilities {
    /// Default capabilities honoring the configured treatment costs.
    pub fn from_config(config: &PolicyTreeConfig) -> Self {
        Self {
            leaf: Arc::new(BestArmLeaf {
                costs: config.costs_of_treat.clone(),
            }),
            adjuster: Arc::new(ProportionalPenalty),
            dominance: Some(Arc::new(UniformBestArm {
                costs: config.costs_of_treat.clone(),
            })),
            ranking: Arc::new(MeanDifferenceRanking),
        }
    }

    pub fn without_early_exit(mut self) -> Self {
        self.dominance = None;
        self
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("early_exit", &self.dominance.is_some())
            .finish()
    }
}
