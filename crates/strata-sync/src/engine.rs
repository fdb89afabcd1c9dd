//! Fetch and push orchestration.
//!
//! A fetch is all-or-nothing: everything it wrote locally is removed again
//! if any step fails. A push is checked for fast-forward safety before a
//! single object is sent, but once the remote session is open there is no
//! undo; a failure mid-push leaves uploaded objects on the remote and the
//! remote ref untouched.

use std::sync::Arc;

use strata_graph::find_common_ancestor;
use strata_refs::Ref;
use tracing::{error, info, warn};

use crate::error::{PushRejection, SyncError, SyncResult};
use crate::guard::{GuardChain, Operation};
use crate::policy::TransferPolicy;
use crate::repository::Repository;
use crate::transfer::ObjectMover;
use crate::transport::{RefChange, RemoteTransport, TransferDirection};
use crate::traverser::CommitTraverser;
use crate::types::{FetchReport, PushReport};

/// Synchronizes repositories with one remote.
///
/// Each call is scoped to a single ref. Syncing several refs is a matter of
/// calling the engine once per ref.
pub struct SyncEngine {
    transport: Arc<dyn RemoteTransport>,
    guards: GuardChain,
}

impl SyncEngine {
    /// An engine with the default guards.
    pub fn new(transport: Arc<dyn RemoteTransport>) -> Self {
        Self::with_guards(transport, GuardChain::default())
    }

    pub fn with_guards(transport: Arc<dyn RemoteTransport>, guards: GuardChain) -> Self {
        Self { transport, guards }
    }

    pub fn transport(&self) -> &dyn RemoteTransport {
        self.transport.as_ref()
    }

    // -----------------------------------------------------------------------
    // Fetch
    // -----------------------------------------------------------------------

    /// Bring everything reachable from `remote_ref` into `repo`.
    ///
    /// A shallow `repo` gets a shallow fetch: `fetch_limit` bounds the walk,
    /// or, without one, the limit is derived from the local depth of the
    /// first commit both sides share. An explicit limit deeper than the
    /// repository's current depth becomes its new shallow depth.
    pub async fn fetch(
        &self,
        repo: &Repository,
        remote_ref: &Ref,
        fetch_limit: Option<u32>,
    ) -> SyncResult<FetchReport> {
        self.guards.check(
            repo,
            &Operation::Fetch {
                fetch_limit,
                full_depth: false,
            },
        )?;
        let report = self.run_fetch(repo, remote_ref, fetch_limit).await?;

        if let (Some(limit), Some(depth)) = (fetch_limit, repo.shallow_depth()) {
            if limit > depth {
                repo.set_shallow_depth(Some(limit));
            }
        }
        Ok(report)
    }

    /// Deepen a shallow clone to the remote's complete history. On success
    /// the repository is no longer shallow.
    pub async fn fetch_full_depth(
        &self,
        repo: &Repository,
        remote_ref: &Ref,
    ) -> SyncResult<FetchReport> {
        self.guards.check(
            repo,
            &Operation::Fetch {
                fetch_limit: None,
                full_depth: true,
            },
        )?;
        let mut report = self.run_fetch(repo, remote_ref, Some(u32::MAX)).await?;
        repo.set_shallow_depth(None);
        report.fetch_limit = None;
        Ok(report)
    }

    async fn run_fetch(
        &self,
        repo: &Repository,
        remote_ref: &Ref,
        fetch_limit: Option<u32>,
    ) -> SyncResult<FetchReport> {
        let transport = self.transport.as_ref();
        let tip = remote_ref.object_id();
        let mut policy = TransferPolicy::for_fetch(repo, fetch_limit);
        let mut mover = ObjectMover::new(repo, transport, TransferDirection::Fetch);
        info!(remote_ref = remote_ref.name(), tip = %tip.short_hex(), ?policy, "fetch started");

        let walk = CommitTraverser::new(repo, transport)
            .traverse(tip, &mut policy, &mut mover)
            .await;
        let traversal = match walk {
            Ok(traversal) => traversal,
            Err(err) => {
                match mover.rollback() {
                    Ok(deleted) => warn!(deleted, error = %err, "fetch failed"),
                    Err(rollback) => {
                        error!(error = %err, %rollback, "fetch failed and could not be rolled back")
                    }
                }
                return Err(err);
            }
        };

        let report = FetchReport {
            tip,
            commits_applied: traversal.applied.len(),
            commits_pruned: traversal.pruned.len(),
            objects_received: mover.objects_moved(),
            fetch_limit: policy.fetch_limit(),
        };
        info!(
            remote_ref = remote_ref.name(),
            commits = report.commits_applied,
            objects = report.objects_received,
            "fetch complete"
        );
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Push
    // -----------------------------------------------------------------------

    /// Decide whether pushing `local_ref` to `refspec` is a fast-forward.
    ///
    /// Returns the remote's current ref (`None` if the remote does not have
    /// it yet) when the push may go ahead, and [`SyncError::PushRejected`]
    /// otherwise. Nothing is transferred.
    pub async fn check_push(
        &self,
        repo: &Repository,
        local_ref: &Ref,
        refspec: &str,
    ) -> SyncResult<Option<Ref>> {
        let Some(remote_ref) = self.transport.resolve_ref(refspec).await? else {
            return Ok(None);
        };
        let remote_id = remote_ref.object_id();
        let local_id = local_ref.object_id();

        if remote_id == local_id {
            return Err(SyncError::PushRejected(PushRejection::NothingToPush));
        }
        if !repo.objects().exists(&remote_id)? {
            return Err(SyncError::PushRejected(PushRejection::RemoteHasChanges));
        }
        match find_common_ancestor(repo.graph(), &remote_id, &local_id)? {
            Some(ancestor) if ancestor == local_id => {
                Err(SyncError::PushRejected(PushRejection::NothingToPush))
            }
            Some(ancestor) if ancestor == remote_id => Ok(Some(remote_ref)),
            _ => Err(SyncError::PushRejected(PushRejection::RemoteHasChanges)),
        }
    }

    /// Send `local_ref`'s history to the remote and move `refspec` to it.
    pub async fn push(
        &self,
        repo: &Repository,
        local_ref: &Ref,
        refspec: &str,
    ) -> SyncResult<PushReport> {
        self.guards.check(
            repo,
            &Operation::Push {
                refspec: refspec.to_string(),
            },
        )?;
        let remote_ref = self.check_push(repo, local_ref, refspec).await?;
        let previous_id = remote_ref.as_ref().map(Ref::object_id);
        let new_id = local_ref.object_id();

        let transport = self.transport.as_ref();
        transport.begin_push().await?;
        info!(refspec, to = %new_id.short_hex(), "push started");

        let mut policy = TransferPolicy::for_push(repo);
        let mut mover = ObjectMover::new(repo, transport, TransferDirection::Push);
        let walk = CommitTraverser::new(repo, transport)
            .traverse(new_id, &mut policy, &mut mover)
            .await;
        let traversal = match walk {
            Ok(traversal) => traversal,
            Err(err) => {
                warn!(
                    refspec,
                    sent = mover.objects_moved(),
                    error = %err,
                    "push failed after the session opened; remote ref left unchanged"
                );
                return Err(err);
            }
        };

        transport.end_push(refspec, new_id, previous_id).await?;

        let report = PushReport {
            refspec: refspec.to_string(),
            new_id,
            previous_id,
            commits_applied: traversal.applied.len(),
            objects_sent: mover.objects_moved(),
        };
        info!(
            refspec,
            commits = report.commits_applied,
            objects = report.objects_sent,
            "push complete"
        );
        Ok(report)
    }

    /// Push `local_ref` to the remote ref of the same name.
    pub async fn push_ref(&self, repo: &Repository, local_ref: &Ref) -> SyncResult<PushReport> {
        let refspec = local_ref.peel().name().to_string();
        self.push(repo, local_ref, &refspec).await
    }

    /// Delete a ref on the remote. Returns its last value, or `None` if the
    /// remote did not have it.
    pub async fn delete_remote_ref(&self, refspec: &str) -> SyncResult<Option<Ref>> {
        let deleted = self.transport.update_ref(refspec, RefChange::Delete).await?;
        match &deleted {
            Some(r) => info!(refspec, was = %r.object_id().short_hex(), "remote ref deleted"),
            None => warn!(refspec, "remote ref to delete does not exist"),
        }
        Ok(deleted)
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("guards", &self.guards)
            .finish_non_exhaustive()
    }
}
