//! Error types for the diff crate.

use strata_types::ObjectId;

/// Errors that can occur while comparing trees.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A tree referenced during the diff is not in the store.
    #[error("tree not found: {0}")]
    TreeNotFound(ObjectId),

    #[error("unexpected object kind for {id}: expected tree, got {actual}")]
    NotATree { id: ObjectId, actual: String },

    #[error("store error: {0}")]
    Store(#[from] strata_store::StoreError),
}

pub type DiffResult<T> = Result<T, DiffError>;
