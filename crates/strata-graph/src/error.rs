//! Error types for the revision graph.

use strata_types::ObjectId;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("node not found: {0:?}")]
    NodeNotFound(ObjectId),

    /// A commit listed itself as its own parent.
    #[error("cycle detected involving node {0:?}")]
    CycleDetected(ObjectId),

    #[error("graph storage error: {0}")]
    Storage(String),
}

pub type GraphResult<T> = Result<T, GraphError>;
