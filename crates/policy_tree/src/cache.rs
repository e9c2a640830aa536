use std::collections::HashMap;
use std::sync::Arc;

/// Candidate subsets for one categorical value set; shared between cache and callers.
pub type SubsetList = Arc<Vec<Vec<i64>>>;

/// Memoized categorical split candidates, one map per policy variable.
///
/// Keys are the exact sorted sets of category codes observed in a partition,
/// so sibling partitions carrying the same categories reuse one enumeration.
#[derive(Debug, Clone, Default)]
pub struct CombinationCache {
    per_variable: Vec<HashMap<Vec<i64>, SubsetList>>,
    hits: usize,
    misses: usize,
}

impl CombinationCache {
    pub fn new(n_variables: usize) -> Self {
        Self {
            per_variable: vec![HashMap::new(); n_variables],
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, variable: usize, values: &[i64]) -> Option<SubsetList> {
        let found = self
            .per_variable
            .get(variable)
            .and_then(|map| map.get(values))
            .cloned();
        match found {
            Some(_) => self.hits += 1,
            None => self.misses += 1,
        }
        found
    }

    pub fn insert(&mut self, variable: usize, values: Vec<i64>, subsets: SubsetList) {
        if variable >= self.per_variable.len() {
            self.per_variable.resize_with(variable + 1, HashMap::new);
        }
        self.per_variable[variable].insert(values, subsets);
    }

    /// Returns the cached entry or computes, stores and returns it.
    pub fn get_or_insert_with<F>(&mut self, variable: usize, values: &[i64], compute: F) -> SubsetList
    where
        F: FnOnce() -> Vec<Vec<i64>>,
    {
        if let Some(hit) = self.get(variable, values) {
            return hit;
        }
        let subsets: SubsetList = Arc::new(compute());
        tracing::trace!(
            variable,
            categories = values.len(),
            candidates = subsets.len(),
            "categorical candidates computed"
        );
        self.insert(variable, values.to_vec(), Arc::clone(&subsets));
        subsets
    }

    /// Number of value sets stored for `variable`.
    pub fn len(&self, variable: usize) -> usize {
        self.per_variable.get(variable).map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.per_variable.iter().all(HashMap::is_empty)
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}
