use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use strata_types::ObjectId;
use tracing::trace;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject};
use crate::traits::ObjectStore;

type ObjectMap = HashMap<ObjectId, StoredObject>;

/// Object store held entirely in memory.
///
/// Backs the in-process transport, the server binary and most tests.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<ObjectMap>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_map(&self) -> StoreResult<RwLockReadGuard<'_, ObjectMap>> {
        self.objects
            .read()
            .map_err(|e| StoreError::Storage(format!("lock poisoned: {e}")))
    }

    fn write_map(&self) -> StoreResult<RwLockWriteGuard<'_, ObjectMap>> {
        self.objects
            .write()
            .map_err(|e| StoreError::Storage(format!("lock poisoned: {e}")))
    }

    pub fn len(&self) -> usize {
        self.read_map().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored objects of one kind.
    pub fn count_of(&self, kind: ObjectKind) -> usize {
        self.read_map()
            .map(|m| m.values().filter(|o| o.kind == kind).count())
            .unwrap_or(0)
    }

    /// All ids, sorted.
    pub fn all_ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self
            .read_map()
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        Ok(self.read_map()?.get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }
        self.write_map()?.entry(id).or_insert_with(|| {
            trace!(object = %id.short_hex(), kind = %object.kind, "stored object");
            object.clone()
        });
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.read_map()?.contains_key(id))
    }

    fn delete(&self, id: &ObjectId) -> StoreResult<bool> {
        let removed = self.write_map()?.remove(id);
        if let Some(object) = &removed {
            trace!(object = %id.short_hex(), kind = %object.kind, "deleted object");
        }
        Ok(removed.is_some())
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("commits", &self.count_of(ObjectKind::Commit))
            .field("objects", &self.len())
            .finish()
    }
}
