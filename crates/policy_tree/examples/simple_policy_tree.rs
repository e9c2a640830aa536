use policy_tree::{OptimalPolicyTree, PolicyData, PolicyTreeConfig, ScoreMatrix};
use std::time::Instant;

fn generate_sample_data(n_units: usize) -> PolicyData {
    let mut age = Vec::with_capacity(n_units);
    let mut visits = Vec::with_capacity(n_units);
    let mut region = Vec::with_capacity(n_units);
    let mut control = Vec::with_capacity(n_units);
    let mut program_a = Vec::with_capacity(n_units);
    let mut program_b = Vec::with_capacity(n_units);

    for i in 0..n_units {
        let a = 18.0 + ((i * 37) % 50) as f64;
        let v = (i % 7) as f64;
        let r = ((i * 3) % 5) as f64;
        age.push(a);
        visits.push(v);
        region.push(r);

        // Program A helps the young, program B helps frequent visitors in regions 0 and 1
        let noise = ((i * 13) % 9) as f64 / 9.0 - 0.5;
        control.push(noise);
        program_a.push(if a < 35.0 { 2.0 } else { -1.0 } + noise);
        program_b.push(if v >= 4.0 && r < 2.0 { 3.0 } else { -0.5 } + noise);
    }

    let scores = ScoreMatrix::from_columns(&[control, program_a, program_b])
        .expect("finite scores");
    PolicyData::from_named_columns(
        vec![
            ("age", "cont", age),
            ("visits", "disc", visits),
            ("region", "unord", region),
        ],
        scores,
    )
    .expect("valid policy data")
}

fn main() {
    println!("=== Simple Policy Tree ===");

    let n_units = 400;
    let data = generate_sample_data(n_units);
    println!(
        "Data shape: {{ units: {}, variables: {}, arms: {} }}",
        data.n_units(),
        data.n_variables(),
        data.n_arms()
    );

    let config = PolicyTreeConfig::default()
        .with_depth(3)
        .with_min_leaf_size(10)
        .with_parallel(None);
    let mut estimator = OptimalPolicyTree::new(config);

    println!("\nFitting tree...");
    let start_time = Instant::now();
    let tree = estimator.fit(&data).expect("fit");
    println!("Tree fitting took: {:?}", start_time.elapsed());

    println!("\n{}", tree.tree_info());

    let arms = estimator.predict(&data).expect("predict");
    println!("Assignments for first 10 units:");
    for (i, arm) in arms.iter().take(10).enumerate() {
        println!(
            "  unit {:>3}: age = {:>4.1} visits = {} region = {} -> arm {}",
            i,
            data.column(0)[i],
            data.column(1)[i],
            data.column(2)[i],
            arm
        );
    }
}
