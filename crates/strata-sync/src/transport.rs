use async_trait::async_trait;
use strata_refs::Ref;
use strata_store::ObjectStore;
use strata_types::ObjectId;

use crate::error::TransportResult;

/// Which way objects flow. Whether an object "exists at the destination"
/// means a local lookup when fetching and a remote query when pushing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferDirection {
    Fetch,
    Push,
}

/// Result of uploading one object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    AlreadyExisted,
}

/// A ref mutation on the remote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefChange {
    Set(ObjectId),
    Delete,
}

/// A remote repository.
///
/// Every call is one round-trip; any failure aborts the caller's operation,
/// retrying is left to whoever drives the engine.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Remote branches and/or tags.
    async fn list_refs(&self, heads: bool, tags: bool) -> TransportResult<Vec<Ref>>;

    /// The remote's HEAD, possibly symbolic. `None` for an empty remote.
    async fn head_ref(&self) -> TransportResult<Option<Ref>>;

    async fn object_exists(&self, id: &ObjectId) -> TransportResult<bool>;

    /// Copy a remote object's raw bytes into `into`. Returns `true` if the
    /// object was not already there.
    async fn get_object(&self, id: &ObjectId, into: &dyn ObjectStore) -> TransportResult<bool>;

    /// Upload an object from `from`.
    async fn send_object(&self, id: &ObjectId, from: &dyn ObjectStore)
        -> TransportResult<SendOutcome>;

    async fn resolve_ref(&self, refspec: &str) -> TransportResult<Option<Ref>>;

    /// Returns the changed ref, or the deleted one. `None` when deleting a
    /// ref the remote does not have.
    async fn update_ref(&self, refspec: &str, change: RefChange) -> TransportResult<Option<Ref>>;

    async fn begin_push(&self) -> TransportResult<()>;

    /// Close the push session: the remote moves `refspec` to `new` only if
    /// it still points at `previous` (`None` meaning it must not exist).
    async fn end_push(
        &self,
        refspec: &str,
        new: ObjectId,
        previous: Option<ObjectId>,
    ) -> TransportResult<()>;
}
