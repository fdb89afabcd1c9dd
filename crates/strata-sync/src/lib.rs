//! Synchronization between Strata repositories.
//!
//! Fetch pulls the history behind a remote ref into a local repository and
//! rolls back everything it wrote if any step fails. Push checks that the
//! remote ref is an ancestor of what is being pushed, uploads the missing
//! history inside a push session, and moves the remote ref only if nobody
//! else moved it in the meantime. Shallow clones are handled on both sides.
//!
//! Remotes are reached through [`RemoteTransport`]: [`HttpTransport`] for the
//! HTTP protocol, [`InProcessTransport`] for a repository in the same
//! process.

pub mod config;
pub mod engine;
pub mod error;
pub mod guard;
pub mod http;
pub mod local;
pub mod policy;
pub mod repository;
pub mod session;
pub mod transfer;
pub mod transport;
pub mod traverser;
pub mod types;

pub use config::{ConfigError, RemoteConfig, SyncConfig, TransportConfig};
pub use engine::SyncEngine;
pub use error::{
    PushRejection, SessionError, SyncError, SyncResult, TransportError, TransportResult,
};
pub use guard::{
    ConflictGuard, GuardChain, GuardDecision, Operation, OperationGuard, ShallowDepthGuard,
};
pub use http::HttpTransport;
pub use local::InProcessTransport;
pub use policy::TransferPolicy;
pub use repository::Repository;
pub use session::PushSessions;
pub use transfer::ObjectMover;
pub use transport::{RefChange, RemoteTransport, SendOutcome, TransferDirection};
pub use traverser::{CommitNode, CommitTraverser, Evaluation, NodeState, Traversal};
pub use types::{FetchReport, PushReport};
