//! Tree diffing for Strata.
//!
//! Compares two revision trees and reports the features that were added,
//! removed or modified between them. Subtrees whose ids match are skipped
//! without being read, so the cost of a diff is proportional to what
//! changed. Bucketed trees are flattened transparently.
//!
//! - [`diff_trees`] -- compare two trees by id
//! - [`DiffEntry`] / [`ChangeType`] -- one changed feature

pub mod error;
pub mod tree_diff;

pub use error::{DiffError, DiffResult};
pub use tree_diff::{diff_trees, ChangeType, DiffEntry};
