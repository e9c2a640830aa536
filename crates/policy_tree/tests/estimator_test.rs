use policy_tree::{
    OptimalPolicyTree, PolicyData, PolicyTree, PolicyTreeConfig, PolicyTreeError, ScoreMatrix,
};

/// Many categories so that candidate subsets have to be sampled.
fn generate_data(n_units: usize) -> PolicyData {
    let region: Vec<f64> = (0..n_units).map(|i| ((i * 7) % 12) as f64).collect();
    let income: Vec<f64> = (0..n_units).map(|i| ((i * 37) % 101) as f64 / 10.0).collect();
    let arms: Vec<Vec<f64>> = (0..3)
        .map(|a| {
            (0..n_units)
                .map(|i| (((i * 5 + a * 17) % 11) as f64 - 5.0) * (1.0 + a as f64 / 2.0))
                .collect()
        })
        .collect();
    PolicyData::from_named_columns(
        vec![("region", "unord", region), ("income", "cont", income)],
        ScoreMatrix::from_columns(&arms).unwrap(),
    )
    .unwrap()
}

fn sampling_config(seed: u64) -> PolicyTreeConfig {
    let mut config = PolicyTreeConfig::default().with_depth(3).with_seed(seed);
    config.no_of_evalupoints = 20;
    config
}

#[test]
fn test_same_seed_gives_same_tree() {
    let data = generate_data(60);
    for select_values_cat in [false, true] {
        let mut config = sampling_config(42);
        config.select_values_cat = select_values_cat;

        let first = OptimalPolicyTree::new(config.clone())
            .fit(&data)
            .unwrap()
            .clone();
        let second = OptimalPolicyTree::new(config.clone())
            .fit(&data)
            .unwrap()
            .clone();
        assert_eq!(first, second, "fits with the same seed must match");

        let parallel_first = OptimalPolicyTree::new(config.clone().with_parallel(Some(2)))
            .fit(&data)
            .unwrap()
            .clone();
        let parallel_second = OptimalPolicyTree::new(config.with_parallel(Some(3)))
            .fit(&data)
            .unwrap()
            .clone();
        assert_eq!(parallel_first, parallel_second);
    }
}

#[test]
fn test_refit_replaces_previous_tree() {
    let data = generate_data(30);
    let mut estimator = OptimalPolicyTree::new(PolicyTreeConfig::default().with_depth(2));
    let first = estimator.fit(&data).unwrap().clone();
    estimator.config.depth = 1;
    let second = estimator.fit(&data).unwrap().clone();
    assert_ne!(first.num_nodes(), second.num_nodes());
    assert_eq!(estimator.tree(), Some(&second));
    assert_eq!(estimator.into_tree(), Some(second));
}

#[test]
fn test_predict_before_fit_fails() {
    let estimator = OptimalPolicyTree::default();
    assert_eq!(
        estimator.predict(&generate_data(10)),
        Err(PolicyTreeError::NotFitted)
    );
}

#[test]
fn test_predict_rejects_data_missing_split_variables() {
    let data = generate_data(40);
    let mut estimator = OptimalPolicyTree::new(PolicyTreeConfig::default().with_depth(3));
    let tree: PolicyTree = estimator.fit(&data).unwrap().clone();

    let uses_income = tree.nodes().iter().any(|n| {
        matches!(&n.content, policy_tree::node::NodeContent::Split { variable_index: 1, .. })
    });
    let only_region = PolicyData::from_named_columns(
        vec![("region", "unord", data.column(0).to_vec())],
        data.scores().clone(),
    )
    .unwrap();
    let result = estimator.predict(&only_region);
    if uses_income {
        assert!(matches!(result, Err(PolicyTreeError::InvalidData(_))));
    } else {
        assert_eq!(result.unwrap().len(), 40);
    }
}

#[test]
fn test_invalid_configs_are_rejected() {
    let data = generate_data(20);
    let cases: Vec<PolicyTreeConfig> = vec![
        PolicyTreeConfig::default().with_depth(0),
        PolicyTreeConfig::default().with_min_leaf_size(0),
        PolicyTreeConfig::default().with_max_by_treat(vec![5.0, 5.0]),
        PolicyTreeConfig::default().with_max_by_treat(vec![5.0, 0.0, 5.0]),
        PolicyTreeConfig::default().with_parallel(Some(0)),
        PolicyTreeConfig {
            no_of_evalupoints: 0,
            ..PolicyTreeConfig::default()
        },
        PolicyTreeConfig {
            eva_cat_mult: 0.001,
            ..PolicyTreeConfig::default()
        },
        PolicyTreeConfig {
            costs_of_treat: Some(vec![1.0]),
            ..PolicyTreeConfig::default()
        },
    ];
    for config in cases {
        let mut estimator = OptimalPolicyTree::new(config.clone());
        let err = estimator.fit(&data).unwrap_err();
        assert!(
            matches!(err, PolicyTreeError::InvalidConfig(_)),
            "{:?} should be rejected, got {:?}",
            config,
            err
        );
        assert!(estimator.tree().is_none());
    }
}

#[test]
fn test_too_few_units_fail_before_searching() {
    let data = generate_data(10);
    let mut estimator = OptimalPolicyTree::new(
        PolicyTreeConfig::default()
            .with_depth(3)
            .with_min_leaf_size(3),
    );
    assert_eq!(
        estimator.fit(&data).unwrap_err(),
        PolicyTreeError::InsufficientUnits {
            units: 10,
            required: 12
        }
    );
}

#[test]
fn test_constant_covariate_has_no_feasible_split() {
    let scores = ScoreMatrix::from_columns(&[vec![0.0; 4], vec![1.0, -1.0, 1.0, -1.0]]).unwrap();
    let data = PolicyData::from_named_columns(vec![("x", "cont", vec![2.0; 4])], scores).unwrap();
    let mut estimator = OptimalPolicyTree::new(PolicyTreeConfig::default());
    let err = estimator.fit(&data).unwrap_err();
    assert_eq!(err, PolicyTreeError::InfeasiblePartition { depth: 2, units: 4 });
    assert_eq!(
        err.to_string(),
        "no feasible split for a depth-2 tree over 4 units"
    );
}

#[test]
fn test_config_serde_round_trip() {
    let config = PolicyTreeConfig::default()
        .with_depth(4)
        .with_max_by_treat(vec![10.0, 20.0])
        .with_parallel(Some(4));
    let json = serde_json::to_string(&config).unwrap();
    let restored: PolicyTreeConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, config);
    assert!(restored.is_restricted());
    assert_eq!(restored.enforced_budget(), Some(&[10.0, 20.0][..]));
    let unenforced = PolicyTreeConfig {
        enforce_restriction: false,
        ..restored.clone()
    };
    assert_eq!(unenforced.enforced_budget(), None);
    assert!(!unenforced.is_restricted());
    assert_eq!(restored.required_units(), 8);
    assert_eq!(restored.min_split_size(4), 4);
}
