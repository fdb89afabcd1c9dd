use strata_diff::DiffError;
use strata_graph::GraphError;
use strata_protocol::ProtocolError;
use strata_refs::RefError;
use strata_store::{ObjectKind, StoreError};
use strata_types::ObjectId;
use thiserror::Error;

/// Why a push was not attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushRejection {
    /// The remote already has everything reachable from the pushed commit.
    NothingToPush,
    /// The remote ref is not an ancestor of the pushed commit.
    RemoteHasChanges,
}

impl std::fmt::Display for PushRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NothingToPush => f.write_str("nothing to push"),
            Self::RemoteHasChanges => f.write_str("remote has changes not present locally"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no push session open for {client}")]
    NoSession { client: String },

    #[error("ref {refspec} was updated by someone else during the push")]
    ConcurrentUpdate { refspec: String },

    #[error("ref error: {0}")]
    Refs(RefError),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("object not found on remote: {0}")]
    ObjectNotFound(ObjectId),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("push session error: {0}")]
    Session(#[from] SessionError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("ref error: {0}")]
    Refs(#[from] RefError),
}

pub type TransportResult<T> = Result<T, TransportError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("push rejected: {0}")]
    PushRejected(PushRejection),

    /// The walk reached a commit missing on one side before reaching
    /// history the other side already has.
    #[error("history too shallow: commit {0} is not available")]
    HistoryTooShallow(ObjectId),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("{guard} refused the operation: {reason}")]
    Refused { guard: &'static str, reason: String },

    #[error("object missing from local store: {0}")]
    MissingObject(ObjectId),

    #[error("object {id} is a {actual}, expected a {expected}")]
    UnexpectedObject {
        id: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("diff error: {0}")]
    Diff(#[from] DiffError),

    #[error("ref error: {0}")]
    Refs(#[from] RefError),
}

impl SyncError {
    /// True when the operation had nothing to do rather than failing.
    pub fn is_up_to_date(&self) -> bool {
        matches!(self, Self::PushRejected(PushRejection::NothingToPush))
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
