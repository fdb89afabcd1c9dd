//! The repository context the engine operates on.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

use strata_graph::{InMemoryRevisionGraph, RevisionGraph};
use strata_refs::{InMemoryRefStore, RefStore};
use strata_store::{InMemoryObjectStore, ObjectStore, RevCommit, RevObject};
use strata_types::ObjectId;
use tracing::debug;

use crate::error::{SyncResult, TransportResult};

/// An object store, its revision graph and its refs, plus the repository
/// state the sync engine consults: shallow-clone depth and unresolved
/// conflicts.
///
/// Shared behind an `Arc` by servers and in-process transports.
pub struct Repository {
    objects: Arc<dyn ObjectStore>,
    graph: Arc<dyn RevisionGraph>,
    refs: Arc<dyn RefStore>,
    shallow_depth: RwLock<Option<u32>>,
    conflicts: RwLock<BTreeSet<String>>,
}

impl Repository {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        graph: Arc<dyn RevisionGraph>,
        refs: Arc<dyn RefStore>,
    ) -> Self {
        Self {
            objects,
            graph,
            refs,
            shallow_depth: RwLock::new(None),
            conflicts: RwLock::new(BTreeSet::new()),
        }
    }

    /// An empty repository backed entirely by memory.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryObjectStore::new()),
            Arc::new(InMemoryRevisionGraph::new()),
            Arc::new(InMemoryRefStore::new()),
        )
    }

    /// Mark the repository as a shallow clone of the given depth.
    pub fn with_shallow_depth(self, depth: u32) -> Self {
        self.set_shallow_depth(Some(depth));
        self
    }

    pub fn objects(&self) -> &dyn ObjectStore {
        self.objects.as_ref()
    }

    pub fn graph(&self) -> &dyn RevisionGraph {
        self.graph.as_ref()
    }

    pub fn refs(&self) -> &dyn RefStore {
        self.refs.as_ref()
    }

    pub fn is_shallow(&self) -> bool {
        self.shallow_depth().is_some()
    }

    pub fn shallow_depth(&self) -> Option<u32> {
        *self
            .shallow_depth
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// `None` turns the repository into a full clone.
    pub fn set_shallow_depth(&self, depth: Option<u32>) {
        *self
            .shallow_depth
            .write()
            .unwrap_or_else(PoisonError::into_inner) = depth;
    }

    pub fn record_conflict(&self, path: impl Into<String>) {
        self.conflicts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into());
    }

    /// Returns `true` if `path` was in conflict.
    pub fn resolve_conflict(&self, path: &str) -> bool {
        self.conflicts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path)
    }

    pub fn has_conflicts(&self) -> bool {
        !self
            .conflicts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    pub fn conflicts(&self) -> Vec<String> {
        self.conflicts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Store raw object bytes received from a peer, indexing commits into
    /// the revision graph. Returns `true` if the object is new.
    pub fn receive_object(&self, id: &ObjectId, raw: &[u8]) -> TransportResult<bool> {
        let created = self.objects.put(id, raw)?;
        if let Some(RevObject::Commit(commit)) = self.objects.get(id)? {
            self.graph.put(id, &commit.parent_ids)?;
        }
        if created {
            debug!(object = %id.short_hex(), "object received");
        }
        Ok(created)
    }

    /// Write a commit and record it in the revision graph.
    pub fn insert_commit(&self, commit: RevCommit) -> SyncResult<ObjectId> {
        let parents = commit.parent_ids.clone();
        let id = self.objects.insert(&RevObject::Commit(commit))?;
        self.graph.put(&id, &parents)?;
        Ok(id)
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("shallow_depth", &self.shallow_depth())
            .field("conflicts", &self.conflicts())
            .finish_non_exhaustive()
    }
}
