use strata_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{RevObject, StoredObject};

/// Content-addressed object store.
///
/// Backends implement the four primitive operations; the typed and raw
/// accessors used by the sync engine are provided on top of them.
///
/// Implementations must satisfy:
/// - Objects are immutable once written and writes are idempotent.
/// - Concurrent reads are always safe.
/// - Raw bytes are only accepted under the id they hash to.
pub trait ObjectStore: Send + Sync {
    /// Read an object. `Ok(None)` if absent.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its content-addressed id.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Delete an object. Returns `true` if it existed.
    fn delete(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Store raw bytes received from a peer under `id`.
    ///
    /// The bytes are decoded and re-hashed; a digest that does not match `id`
    /// is rejected with [`StoreError::HashMismatch`]. Returns `true` if the
    /// object was not present before.
    fn put(&self, id: &ObjectId, raw: &[u8]) -> StoreResult<bool> {
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }
        let object = StoredObject::from_raw(id, raw)?;
        let computed = object.compute_id();
        if computed != *id {
            return Err(StoreError::HashMismatch {
                expected: *id,
                computed,
            });
        }
        if self.exists(id)? {
            return Ok(false);
        }
        self.write(&object)?;
        Ok(true)
    }

    /// The raw bytes of an object, as sent to peers.
    fn get_raw(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.read(id)?.map(|o| o.to_raw()))
    }

    /// Read and parse an object. `Ok(None)` if absent.
    fn get(&self, id: &ObjectId) -> StoreResult<Option<RevObject>> {
        match self.read(id)? {
            Some(stored) => RevObject::from_stored(id, &stored).map(Some),
            None => Ok(None),
        }
    }

    /// Encode and write a revision object.
    fn insert(&self, object: &RevObject) -> StoreResult<ObjectId> {
        self.write(&object.to_stored()?)
    }
}
