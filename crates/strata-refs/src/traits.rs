//! The [`RefStore`] trait.

use strata_types::ObjectId;

use crate::error::Result;
use crate::names::search_candidates;
use crate::types::{Ref, HEAD};

/// Storage backend for named references.
///
/// Implementations must be thread-safe and make each operation atomic with
/// respect to the others; [`RefStore::compare_and_swap`] is what a push
/// session relies on to detect concurrent pushes.
pub trait RefStore: Send + Sync {
    /// Read a ref by full name, resolving one level of symbolic indirection.
    ///
    /// `Ok(None)` if the ref is absent or is symbolic with a missing target.
    fn read_ref(&self, name: &str) -> Result<Option<Ref>>;

    /// Point `name` at `object_id`. Writing to a symbolic ref updates its
    /// target.
    fn write_ref(&self, name: &str, object_id: ObjectId) -> Result<()>;

    /// Make `name` a symbolic ref to the direct ref `target`.
    fn write_symbolic(&self, name: &str, target: &str) -> Result<()>;

    /// Delete a ref, returning its last value if it existed.
    fn delete_ref(&self, name: &str) -> Result<Option<Ref>>;

    /// All resolvable refs whose name starts with `prefix`, sorted by name.
    fn list_refs(&self, prefix: &str) -> Result<Vec<Ref>>;

    /// Set `name` to `new` only if its current value is `expected`
    /// (`None` meaning the ref must not exist).
    fn compare_and_swap(
        &self,
        name: &str,
        expected: Option<ObjectId>,
        new: ObjectId,
    ) -> Result<Ref>;

    /// Resolve a possibly-short spec (`main`, `heads/main`, `v1`).
    fn resolve(&self, spec: &str) -> Result<Option<Ref>> {
        for candidate in search_candidates(spec) {
            if let Some(found) = self.read_ref(&candidate)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    fn head(&self) -> Result<Option<Ref>> {
        self.read_ref(HEAD)
    }
}
