use crate::error::{PolicyTreeError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_EVALUATION_POINTS: usize = 100;
pub const DEFAULT_SEED: u64 = 12345;
/// Tolerance added to ordered thresholds when routing units left.
pub const THRESHOLD_EPSILON: f64 = 1e-15;
/// Below this many categories value selection keeps every category.
pub const MIN_SELECTED_CATEGORIES: usize = 6;

/// Parameters of one optimal policy tree search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyTreeConfig {
    /// Number of levels, counting the leaf level (depth 1 is a single leaf).
    pub depth: usize,
    pub min_leaf_size: usize,
    /// Budget of split candidates per covariate and node.
    pub no_of_evalupoints: usize,
    /// Multiplier on `no_of_evalupoints` for unordered covariates.
    pub eva_cat_mult: f64,
    /// Draw a random subset of categories instead of ranking them by score differences.
    pub select_values_cat: bool,
    /// Maximum number of units per arm (global budget restriction).
    pub max_by_treat: Option<Vec<f64>>,
    pub enforce_restriction: bool,
    /// Per-unit cost subtracted from each arm's score.
    pub costs_of_treat: Option<Vec<f64>>,
    pub parallel: bool,
    pub n_workers: Option<usize>,
    pub seed: u64,
}

impl Default for PolicyTreeConfig {
    fn default() -> Self {
        Self {
            depth: 2,
            min_leaf_size: 1,
            no_of_evalupoints: DEFAULT_EVALUATION_POINTS,
            eva_cat_mult: 1.0,
            select_values_cat: false,
            max_by_treat: None,
            enforce_restriction: true,
            costs_of_treat: None,
            parallel: false,
            n_workers: None,
            seed: DEFAULT_SEED,
        }
    }
}

impl PolicyTreeConfig {
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_min_leaf_size(mut self, min_leaf_size: usize) -> Self {
        self.min_leaf_size = min_leaf_size;
        self
    }

    pub fn with_parallel(mut self, n_workers: Option<usize>) -> Self {
        self.parallel = true;
        self.n_workers = n_workers;
        self
    }

    pub fn with_max_by_treat(mut self, max_by_treat: Vec<f64>) -> Self {
        self.max_by_treat = Some(max_by_treat);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Per-arm budget the search has to respect, if any.
    pub fn enforced_budget(&self) -> Option<&[f64]> {
        if self.enforce_restriction {
            self.max_by_treat.as_deref()
        } else {
            None
        }
    }

    /// Whether rewards must go through the budget adjuster during search.
    pub fn is_restricted(&self) -> bool {
        self.enforced_budget().is_some()
    }

    /// Candidate budget for unordered covariates.
    pub fn categorical_budget(&self) -> usize {
        (self.no_of_evalupoints as f64 * self.eva_cat_mult) as usize
    }

    /// Smallest unit count a child must keep when `remaining_depth` levels are left at its parent.
    pub fn min_split_size(&self, remaining_depth: usize) -> usize {
        let shift = remaining_depth.saturating_sub(2).min(usize::BITS as usize - 1);
        self.min_leaf_size.saturating_mul(1usize << shift)
    }

    /// Units needed to fill every leaf of a full tree of the configured depth.
    pub fn required_units(&self) -> usize {
        let shift = self.depth.saturating_sub(1).min(usize::BITS as usize - 1);
        self.min_leaf_size.saturating_mul(1usize << shift)
    }

    pub fn validate(&self, n_arms: usize) -> Result<()> {
        if self.depth == 0 {
            return Err(PolicyTreeError::InvalidConfig(
                "depth must be at least 1".into(),
            ));
        }
        if self.min_leaf_size == 0 {
            return Err(PolicyTreeError::InvalidConfig(
                "min_leaf_size must be at least 1".into(),
            ));
        }
        if self.no_of_evalupoints == 0 {
            return Err(PolicyTreeError::InvalidConfig(
                "no_of_evalupoints must be positive".into(),
            ));
        }
        if !(self.eva_cat_mult.is_finite() && self.eva_cat_mult > 0.0) {
            return Err(PolicyTreeError::InvalidConfig(format!(
                "eva_cat_mult must be positive and finite, got {}",
                self.eva_cat_mult
            )));
        }
        if self.categorical_budget() == 0 {
            return Err(PolicyTreeError::InvalidConfig(
                "no_of_evalupoints * eva_cat_mult rounds down to zero".into(),
            ));
        }
        if let Some(max_by_treat) = &self.max_by_treat {
            if max_by_treat.len() != n_arms {
                return Err(PolicyTreeError::InvalidConfig(format!(
                    "max_by_treat has {} entries for {} arms",
                    max_by_treat.len(),
                    n_arms
                )));
            }
            if max_by_treat.iter().any(|b| !(b.is_finite() && *b > 0.0)) {
                return Err(PolicyTreeError::InvalidConfig(
                    "max_by_treat entries must be positive".into(),
                ));
            }
        }
        if let Some(costs) = &self.costs_of_treat {
            if costs.len() != n_arms {
                return Err(PolicyTreeError::InvalidConfig(format!(
                    "costs_of_treat has {} entries for {} arms",
                    costs.len(),
                    n_arms
                )));
            }
        }
        if self.n_workers == Some(0) {
            return Err(PolicyTreeError::InvalidConfig(
                "n_workers must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
