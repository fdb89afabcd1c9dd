//! Error types for reference operations.

use strata_types::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefError {
    #[error("ref not found: {name}")]
    NotFound { name: String },

    #[error("invalid ref name: {name}: {reason}")]
    InvalidName { name: String, reason: String },

    /// Symbolic refs may only point at direct refs.
    #[error("invalid symbolic target for {name}: {target}")]
    InvalidSymbolicTarget { name: String, target: String },

    /// A compare-and-swap found a different value than expected.
    #[error("ref {name} changed concurrently: expected {expected:?}, found {actual:?}")]
    Conflict {
        name: String,
        expected: Option<ObjectId>,
        actual: Option<ObjectId>,
    },

    #[error("ref storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, RefError>;
