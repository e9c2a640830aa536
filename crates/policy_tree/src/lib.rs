//! # Policy Tree
//!
//! Exact search for the depth-bounded decision tree that assigns each unit the
//! treatment arm maximizing the total policy score.
//!
//! ## Key Features
//!
//! - **Exhaustive Search**: every (covariate, candidate) pair is tried at every level
//! - **Mixed Covariates**: continuous, discrete and unordered categorical variables
//! - **Memoized Categories**: categorical subset enumerations are cached per value set
//! - **Parallel Root**: one search task per root covariate on a bounded rayon pool
//!
//! ## Example
//!
//! ```rust,ignore
//! use policy_tree::{OptimalPolicyTree, PolicyData, PolicyTreeConfig, ScoreMatrix};
//!
//! let scores = ScoreMatrix::from_columns(&[vec![0.0; 8], vec![-1., -1., -1., -1., 5., 5., 5., 5.]])?;
//! let data = PolicyData::from_named_columns(
//!     vec![("x", "cont", (1..=8).map(f64::from).collect())],
//!     scores,
//! )?;
//! let mut estimator = OptimalPolicyTree::new(PolicyTreeConfig::default().with_depth(2));
//! let tree = estimator.fit(&data)?;
//! println!("{}", tree.tree_info());
//! ```

// Module declarations
pub mod cache;
pub mod combinatorics;
pub mod conf;
pub mod data;
pub mod error;
pub mod estimator;
pub mod evaluation;
pub mod node;
pub mod parallel;
pub mod search;
pub mod split;
pub mod tree;

pub use conf::PolicyTreeConfig;
pub use data::{PolicyData, PolicyVariable, ScoreMatrix, VariableKind};
pub use error::{PolicyTreeError, Result};
pub use estimator::OptimalPolicyTree;
pub use tree::PolicyTree;
