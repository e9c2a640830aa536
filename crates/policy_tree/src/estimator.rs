use crate::conf::PolicyTreeConfig;
use crate::data::PolicyData;
use crate::error::{PolicyTreeError, Result};
use crate::evaluation::Capabilities;
use crate::node::NodeContent;
use crate::parallel::{default_workers, search_root_parallel};
use crate::search::{SearchContext, SearchEngine};
use crate::tree::PolicyTree;
use std::sync::Arc;
use std::time::Instant;

/// Builds the reward-maximizing policy tree of a fixed depth.
pub struct OptimalPolicyTree {
    pub config: PolicyTreeConfig,
    capabilities: Capabilities,
    tree: Option<PolicyTree>,
}

impl Default for OptimalPolicyTree {
    fn default() -> Self {
        Self::new(PolicyTreeConfig::default())
    }
}

impl OptimalPolicyTree {
    pub fn new(config: PolicyTreeConfig) -> Self {
        let capabilities = Capabilities::from_config(&config);
        Self::with_capabilities(config, capabilities)
    }

    pub fn with_capabilities(config: PolicyTreeConfig, capabilities: Capabilities) -> Self {
        OptimalPolicyTree {
            config,
            capabilities,
            tree: None,
        }
    }

    pub fn fit(&mut self, data: &PolicyData) -> Result<&PolicyTree> {
        self.fit_shared(Arc::new(data.clone()))
    }

    /// Like [`fit`](Self::fit) without copying data that is already shared.
    pub fn fit_shared(&mut self, data: Arc<PolicyData>) -> Result<&PolicyTree> {
        self.tree = None;
        let config = &self.config;
        config.validate(data.n_arms())?;

        let n_units = data.n_units();
        let required = config.required_units();
        if n_units < required {
            return Err(PolicyTreeError::InsufficientUnits {
                units: n_units,
                required,
            });
        }

        tracing::info!(
            units = n_units,
            arms = data.n_arms(),
            variables = data.n_variables(),
            depth = config.depth,
            min_leaf_size = config.min_leaf_size,
            parallel = config.parallel,
            "building optimal policy tree"
        );
        let start = Instant::now();

        let ctx = Arc::new(SearchContext::new(
            data,
            config.clone(),
            self.capabilities.clone(),
        ));
        let cache = ctx.primed_cache();

        let outcome = if config.parallel && config.depth > 1 {
            let n_workers = config
                .n_workers
                .unwrap_or_else(|| default_workers(ctx.data.n_variables()));
            search_root_parallel(Arc::clone(&ctx), cache, n_workers)?
        } else {
            let units: Vec<usize> = (0..n_units).collect();
            let mut engine = SearchEngine::new(&ctx, cache);
            let outcome = engine.search(&units, config.depth, config.seed);
            tracing::debug!(
                cache_hits = engine.cache().hits(),
                cache_misses = engine.cache().misses(),
                "sequential search finished"
            );
            outcome
        };

        let outcome = outcome.ok_or(PolicyTreeError::InfeasiblePartition {
            depth: config.depth,
            units: n_units,
        })?;

        tracing::info!(
            reward = outcome.reward,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "optimal policy tree built"
        );
        let tree = PolicyTree::from_outcome(outcome, config.depth);
        Ok(&*self.tree.insert(tree))
    }

    pub fn tree(&self) -> Option<&PolicyTree> {
        self.tree.as_ref()
    }

    pub fn into_tree(self) -> Option<PolicyTree> {
        self.tree
    }

    /// Arm assigned to every unit of `data` by the fitted tree.
    pub fn predict(&self, data: &PolicyData) -> Result<Vec<usize>> {
        let tree = self.tree.as_ref().ok_or(PolicyTreeError::NotFitted)?;
        let needed = tree
            .nodes()
            .iter()
            .filter_map(|n| match &n.content {
                NodeContent::Split { variable_index, .. } => Some(variable_index + 1),
                NodeContent::Terminal { .. } => None,
            })
            .max()
            .unwrap_or(0);
        if data.n_variables() < needed {
            return Err(PolicyTreeError::InvalidData(format!(
                "tree splits on {} variables but data has {}",
                needed,
                data.n_variables()
            )));
        }
        Ok(tree.predict_all(data))
    }
}
