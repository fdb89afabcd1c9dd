//! Reference management for Strata.
//!
//! Refs are the only mutable state in a repository: named pointers to commit
//! ids. A ref is either direct or symbolic, and a symbolic ref points at a
//! direct ref by name (one level of indirection, never a cycle).
//!
//! - [`types`] -- [`Ref`] and the well-known namespaces
//! - [`names`] -- name validation and short-name qualification
//! - [`traits`] -- the [`RefStore`] storage interface
//! - [`memory`] -- [`InMemoryRefStore`]

pub mod error;
pub mod memory;
pub mod names;
pub mod traits;
pub mod types;

pub use error::{RefError, Result};
pub use memory::InMemoryRefStore;
pub use names::{qualify, search_candidates, validate_ref_name};
pub use traits::RefStore;
pub use types::{Ref, HEAD, HEADS_PREFIX, REMOTES_PREFIX, TAGS_PREFIX};
