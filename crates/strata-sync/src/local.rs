//! A transport to a repository living in the same process.

use std::sync::Arc;

use async_trait::async_trait;
use strata_refs::{Ref, RefStore};
use strata_store::{ObjectStore, StoreError};
use strata_types::ObjectId;

use crate::error::{TransportError, TransportResult};
use crate::repository::Repository;
use crate::session::PushSessions;
use crate::transport::{RefChange, RemoteTransport, SendOutcome};

/// Talks to a [`Repository`] directly, with the same semantics the HTTP
/// server gives its endpoints.
pub struct InProcessTransport {
    remote: Arc<Repository>,
    sessions: Arc<PushSessions>,
    client_id: String,
}

impl InProcessTransport {
    pub fn new(remote: Arc<Repository>) -> Self {
        Self::with_sessions(remote, Arc::new(PushSessions::new()), "local")
    }

    /// Share push sessions with other clients of the same remote.
    pub fn with_sessions(
        remote: Arc<Repository>,
        sessions: Arc<PushSessions>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            remote,
            sessions,
            client_id: client_id.into(),
        }
    }

    pub fn remote(&self) -> &Arc<Repository> {
        &self.remote
    }
}

#[async_trait]
impl RemoteTransport for InProcessTransport {
    async fn list_refs(&self, heads: bool, tags: bool) -> TransportResult<Vec<Ref>> {
        Ok(self
            .remote
            .refs()
            .list_refs("refs/")?
            .into_iter()
            .filter(|r| (heads && r.is_branch()) || (tags && r.is_tag()))
            .collect())
    }

    async fn head_ref(&self) -> TransportResult<Option<Ref>> {
        Ok(self.remote.refs().head()?)
    }

    async fn object_exists(&self, id: &ObjectId) -> TransportResult<bool> {
        Ok(self.remote.objects().exists(id)?)
    }

    async fn get_object(&self, id: &ObjectId, into: &dyn ObjectStore) -> TransportResult<bool> {
        let raw = self
            .remote
            .objects()
            .get_raw(id)?
            .ok_or(TransportError::ObjectNotFound(*id))?;
        Ok(into.put(id, &raw)?)
    }

    async fn send_object(
        &self,
        id: &ObjectId,
        from: &dyn ObjectStore,
    ) -> TransportResult<SendOutcome> {
        let raw = from.get_raw(id)?.ok_or(StoreError::NotFound(*id))?;
        Ok(if self.remote.receive_object(id, &raw)? {
            SendOutcome::Sent
        } else {
            SendOutcome::AlreadyExisted
        })
    }

    async fn resolve_ref(&self, refspec: &str) -> TransportResult<Option<Ref>> {
        Ok(self.remote.refs().resolve(refspec)?)
    }

    async fn update_ref(&self, refspec: &str, change: RefChange) -> TransportResult<Option<Ref>> {
        let refs = self.remote.refs();
        match change {
            RefChange::Set(id) => {
                refs.write_ref(refspec, id)?;
                Ok(refs.read_ref(refspec)?)
            }
            RefChange::Delete => Ok(refs.delete_ref(refspec)?),
        }
    }

    async fn begin_push(&self) -> TransportResult<()> {
        self.sessions.begin(&self.client_id);
        Ok(())
    }

    async fn end_push(
        &self,
        refspec: &str,
        new: ObjectId,
        previous: Option<ObjectId>,
    ) -> TransportResult<()> {
        self.sessions
            .end(&self.client_id, self.remote.refs(), refspec, new, previous)?;
        Ok(())
    }
}
