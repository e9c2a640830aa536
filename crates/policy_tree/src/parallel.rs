//! Root-level fan-out: one search task per policy variable on a bounded pool.

use crate::cache::CombinationCache;
use crate::error::{PolicyTreeError, Result};
use crate::search::{SearchContext, SearchEngine, SearchOutcome};
use std::sync::Arc;
use std::sync::mpsc;

/// Seed of the task splitting the root on variable `m`.
pub fn task_seed(base: u64, m: usize) -> u64 {
    base.wrapping_add((m as u64).wrapping_pow(3))
}

/// Worker count to use when none is configured.
pub fn default_workers(n_tasks: usize) -> usize {
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    available.min(n_tasks).max(1)
}

/// Runs one full search per root variable and keeps the best.
///
/// Each task receives its own copy of `cache`. Results are drained as they
/// complete; ties on reward go to the lowest variable index so the outcome does
/// not depend on completion order. A task that dies without reporting fails
/// the whole search.
pub fn search_root_parallel(
    ctx: Arc<SearchContext>,
    cache: CombinationCache,
    n_workers: usize,
) -> Result<Option<SearchOutcome>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(n_workers)
        .thread_name(|i| format!("policy-tree-{}", i))
        .panic_handler(|_| tracing::warn!("policy tree search task panicked"))
        .build()
        .map_err(|e| PolicyTreeError::ThreadPool(e.to_string()))?;

    let n_tasks = ctx.data.n_variables();
    let units: Arc<Vec<usize>> = Arc::new((0..ctx.data.n_units()).collect());
    let (tx, rx) = mpsc::channel::<(usize, Option<SearchOutcome>)>();

    for m in 0..n_tasks {
        let tx = tx.clone();
        let ctx = Arc::clone(&ctx);
        let units = Arc::clone(&units);
        let cache = cache.clone();
        pool.spawn(move || {
            let seed = task_seed(ctx.config.seed, m);
            let mut engine = SearchEngine::new(&ctx, cache);
            let outcome = engine.search_variable(m, &units, ctx.config.depth, seed);
            // The receiver is drained until every task has dropped its sender.
            let _ = tx.send((m, outcome));
        });
    }
    drop(tx);

    let mut results: Vec<Option<Option<SearchOutcome>>> = (0..n_tasks).map(|_| None).collect();
    let mut completed = 0usize;
    for (m, outcome) in rx.iter() {
        completed += 1;
        tracing::debug!(
            variable = %ctx.data.variables()[m].name,
            reward = outcome.as_ref().map(|o| o.reward),
            completed,
            total = n_tasks,
            "root split task finished ({:.1}% done)",
            completed as f64 / n_tasks as f64 * 100.0
        );
        results[m] = Some(outcome);
    }
    if completed < n_tasks {
        return Err(PolicyTreeError::TaskFailed(format!(
            "{} of {} root split tasks did not report a result",
            n_tasks - completed,
            n_tasks
        )));
    }

    let mut best: Option<SearchOutcome> = None;
    for outcome in results.into_iter().flatten().flatten() {
        if best.as_ref().map_or(true, |b| outcome.reward > b.reward) {
            best = Some(outcome);
        }
    }
    Ok(best)
}
