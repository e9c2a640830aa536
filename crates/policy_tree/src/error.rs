//! Error type shared by every fallible operation of the crate.

/// Errors raised while validating inputs or searching for an optimal tree.
///
/// Every variant is fatal for the current fit: no partial tree is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyTreeError {
    #[error("unknown policy variable kind: '{0}' (expected cont, disc or unord)")]
    UnknownVariableKind(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("{units} units cannot fill a tree that needs at least {required}")]
    InsufficientUnits { units: usize, required: usize },

    #[error("no feasible split for a depth-{depth} tree over {units} units")]
    InfeasiblePartition { depth: usize, units: usize },

    #[error("thread pool error: {0}")]
    ThreadPool(String),

    #[error("search task failed: {0}")]
    TaskFailed(String),

    #[error("the policy tree has not been fitted")]
    NotFitted,
}

pub type Result<T> = std::result::Result<T, PolicyTreeError>;
