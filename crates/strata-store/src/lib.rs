//! Content-addressed storage for Strata revision objects.
//!
//! Every entity in a repository except refs is immutable and named by the
//! digest of its canonical bytes:
//!
//! - [`RevCommit`] -- tree id, ordered parents, author, message
//! - [`RevTree`] -- sorted child [`Node`]s, or hashed [`Bucket`]s when large
//! - [`RevFeature`] -- a leaf payload
//! - [`RevFeatureType`] -- schema metadata referenced by nodes
//!
//! # Design Rules
//!
//! 1. `id(object) == hash(canonical-bytes(object))`; [`ObjectStore::put`]
//!    rejects raw bytes whose digest does not match the key.
//! 2. Tree children are ordered by name so equal trees hash equally.
//! 3. Concurrent reads are always safe; writes are idempotent.

pub mod error;
pub mod hasher;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use hasher::ContentHasher;
pub use memory::InMemoryObjectStore;
pub use object::{
    child_path, Bucket, Node, NodeKind, NodeRef, ObjectKind, RevCommit, RevFeature, RevFeatureType,
    RevObject, RevTree, StoredObject, TreeContents,
};
pub use traits::ObjectStore;
