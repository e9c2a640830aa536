use policy_tree::cache::CombinationCache;
use policy_tree::evaluation::Capabilities;
use policy_tree::search::{SearchContext, SearchEngine};
use policy_tree::{PolicyData, PolicyTreeConfig, ScoreMatrix};
use std::sync::Arc;

#[test]
fn get_or_insert_computes_each_value_set_once() {
    let mut cache = CombinationCache::new(2);
    assert!(cache.is_empty());

    let mut calls = 0;
    let first = cache.get_or_insert_with(1, &[0, 1, 2], || {
        calls += 1;
        vec![vec![0], vec![1], vec![2]]
    });
    let second = cache.get_or_insert_with(1, &[0, 1, 2], || {
        calls += 1;
        Vec::new()
    });

    assert_eq!(calls, 1);
    assert!(Arc::ptr_eq(&first, &second), "hits must share the stored list");
    assert_eq!(cache.hits(), 1);
    assert_eq!(cache.misses(), 1);
    assert_eq!(cache.len(1), 1);
    assert_eq!(cache.len(0), 0);
}

#[test]
fn keys_are_exact_value_sets() {
    let mut cache = CombinationCache::new(1);
    cache.insert(0, vec![1, 2], Arc::new(vec![vec![1]]));
    assert!(cache.get(0, &[1, 2]).is_some());
    assert!(cache.get(0, &[1, 2, 3]).is_none());
    assert!(cache.get(0, &[2]).is_none());
    // Variables outside the cache simply miss.
    assert!(cache.get(5, &[1, 2]).is_none());
    assert_eq!(cache.misses(), 3);
}

#[test]
fn clones_do_not_share_later_inserts() {
    let mut original = CombinationCache::new(1);
    original.insert(0, vec![0, 1], Arc::new(vec![vec![0]]));
    let mut copy = original.clone();
    copy.insert(0, vec![0, 1, 2], Arc::new(vec![vec![0], vec![1], vec![2]]));
    assert_eq!(original.len(0), 1);
    assert_eq!(copy.len(0), 2);
}

fn categorical_data() -> PolicyData {
    let n = 24;
    let city: Vec<f64> = (0..n).map(|i| (i % 4) as f64).collect();
    let size: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let treatment: Vec<f64> = (0..n).map(|i| if i % 4 < 2 { 2.0 } else { -1.0 }).collect();
    PolicyData::from_named_columns(
        vec![("size", "cont", size), ("city", "unord", city)],
        ScoreMatrix::from_columns(&[vec![0.0; n], treatment]).unwrap(),
    )
    .unwrap()
}

#[test]
fn primed_cache_holds_root_value_sets() {
    let config = PolicyTreeConfig::default().with_depth(3);
    let ctx = SearchContext::new(
        Arc::new(categorical_data()),
        config.clone(),
        Capabilities::from_config(&config),
    );
    let cache = ctx.primed_cache();
    assert_eq!(cache.len(0), 0, "ordered covariates are never cached");
    assert_eq!(cache.len(1), 1);

    let mut engine = SearchEngine::new(&ctx, cache);
    let units: Vec<usize> = (0..24).collect();
    let outcome = engine.search(&units, 3, config.seed).unwrap();
    assert_eq!(outcome.reward, 24.0);
    assert!(engine.cache().hits() > 0, "root lookups must hit the primed entry");
    assert!(engine.into_cache().len(1) > 1);
}
