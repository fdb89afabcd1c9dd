//! The four transfer policies: deep or shallow, fetch or push.

use tracing::debug;

use crate::error::{SyncError, SyncResult};
use crate::repository::Repository;
use crate::transport::{RemoteTransport, TransferDirection};
use crate::traverser::{CommitNode, Evaluation};

/// Decides, commit by commit, how far a walk goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferPolicy {
    /// Stop at commits the local store already has.
    DeepFetch,
    /// Stop beyond `limit`. Without a limit, the first commit found locally
    /// derives one from the local shallow depth at that commit.
    ShallowFetch { limit: Option<u32> },
    /// Stop at commits the remote already has.
    DeepPush,
    /// Like `DeepPush`, but running out of local history first is fatal.
    ShallowPush,
}

impl TransferPolicy {
    pub fn for_fetch(repo: &Repository, limit: Option<u32>) -> Self {
        if repo.is_shallow() {
            Self::ShallowFetch { limit }
        } else {
            Self::DeepFetch
        }
    }

    pub fn for_push(repo: &Repository) -> Self {
        if repo.is_shallow() {
            Self::ShallowPush
        } else {
            Self::DeepPush
        }
    }

    pub fn direction(&self) -> TransferDirection {
        match self {
            Self::DeepFetch | Self::ShallowFetch { .. } => TransferDirection::Fetch,
            Self::DeepPush | Self::ShallowPush => TransferDirection::Push,
        }
    }

    /// The depth limit in effect, explicit or derived.
    pub fn fetch_limit(&self) -> Option<u32> {
        match self {
            Self::ShallowFetch { limit } => *limit,
            _ => None,
        }
    }

    pub async fn evaluate(
        &mut self,
        node: &CommitNode,
        local: &Repository,
        transport: &dyn RemoteTransport,
    ) -> SyncResult<Evaluation> {
        let id = &node.id;
        match self {
            Self::DeepFetch => Ok(if local.objects().exists(id)? {
                Evaluation::ExcludeAndPrune
            } else {
                Evaluation::IncludeAndContinue
            }),
            Self::ShallowFetch { limit } => {
                match *limit {
                    Some(max) if node.depth > max => return Ok(Evaluation::ExcludeAndPrune),
                    Some(_) => {}
                    None => {
                        if local.objects().exists(id)? {
                            let local_depth = local.graph().depth(id)?;
                            let derived = local_depth + node.depth - 1;
                            debug!(
                                commit = %id.short_hex(),
                                local_depth,
                                traversal_depth = node.depth,
                                derived,
                                "derived fetch limit"
                            );
                            *limit = Some(derived);
                        }
                    }
                }
                Ok(Evaluation::IncludeAndContinue)
            }
            Self::DeepPush => Ok(if transport.object_exists(id).await? {
                Evaluation::ExcludeAndPrune
            } else {
                Evaluation::IncludeAndContinue
            }),
            Self::ShallowPush => {
                if transport.object_exists(id).await? {
                    return Ok(Evaluation::ExcludeAndPrune);
                }
                if !id.is_null() && !local.objects().exists(id)? {
                    return Err(SyncError::HistoryTooShallow(*id));
                }
                Ok(Evaluation::IncludeAndContinue)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::InProcessTransport;
    use std::sync::Arc;
    use strata_store::{RevCommit, RevTree};
    use strata_types::ObjectId;

    fn chain(repo: &Repository, n: usize) -> Vec<ObjectId> {
        let tree = repo.objects().insert(&RevTree::empty().into()).unwrap();
        let mut ids: Vec<ObjectId> = Vec::new();
        for i in 0..n {
            let parents = ids.last().copied().into_iter().collect();
            let id = repo
                .insert_commit(RevCommit::new(tree, parents, "ana", format!("c{i}"), i as i64))
                .unwrap();
            ids.push(id);
        }
        ids
    }

    fn node(id: ObjectId, depth: u32) -> CommitNode {
        CommitNode { id, depth }
    }

    #[test]
    fn selection_follows_shallowness() {
        let full = Repository::in_memory();
        assert_eq!(TransferPolicy::for_fetch(&full, Some(3)), TransferPolicy::DeepFetch);
        assert_eq!(TransferPolicy::for_push(&full), TransferPolicy::DeepPush);

        let shallow = Repository::in_memory().with_shallow_depth(2);
        assert_eq!(
            TransferPolicy::for_fetch(&shallow, Some(3)),
            TransferPolicy::ShallowFetch { limit: Some(3) }
        );
        assert_eq!(TransferPolicy::for_push(&shallow), TransferPolicy::ShallowPush);
        assert_eq!(TransferPolicy::ShallowPush.direction(), TransferDirection::Push);
    }

    #[tokio::test]
    async fn deep_fetch_prunes_known_commits() {
        let local = Repository::in_memory();
        let ids = chain(&local, 1);
        let transport = InProcessTransport::new(Arc::new(Repository::in_memory()));

        let mut policy = TransferPolicy::DeepFetch;
        assert_eq!(
            policy.evaluate(&node(ids[0], 1), &local, &transport).await.unwrap(),
            Evaluation::ExcludeAndPrune
        );
        assert_eq!(
            policy
                .evaluate(&node(ObjectId::from_hash([1; 32]), 1), &local, &transport)
                .await
                .unwrap(),
            Evaluation::IncludeAndContinue
        );
    }

    #[tokio::test]
    async fn shallow_fetch_respects_explicit_limit() {
        let local = Repository::in_memory().with_shallow_depth(1);
        let transport = InProcessTransport::new(Arc::new(Repository::in_memory()));
        let mut policy = TransferPolicy::ShallowFetch { limit: Some(2) };
        let unknown = ObjectId::from_hash([1; 32]);

        assert_eq!(
            policy.evaluate(&node(unknown, 2), &local, &transport).await.unwrap(),
            Evaluation::IncludeAndContinue
        );
        assert_eq!(
            policy.evaluate(&node(unknown, 3), &local, &transport).await.unwrap(),
            Evaluation::ExcludeAndPrune
        );
    }

    #[tokio::test]
    async fn shallow_fetch_derives_limit_from_local_depth() {
        // Local shallow clone holds c1 <- c2 with depth(c2) = 2.
        let source = Repository::in_memory();
        let ids = chain(&source, 3);
        let local = Repository::in_memory().with_shallow_depth(2);
        for id in &ids[1..] {
            let raw = source.objects().get_raw(id).unwrap().unwrap();
            local.receive_object(id, &raw).unwrap();
        }
        assert_eq!(local.graph().depth(&ids[2]).unwrap(), 2);

        let transport = InProcessTransport::new(Arc::new(Repository::in_memory()));
        let mut policy = TransferPolicy::ShallowFetch { limit: None };

        // c2 reached at traversal depth 2 -> limit 2 + 2 - 1.
        assert_eq!(
            policy.evaluate(&node(ids[2], 2), &local, &transport).await.unwrap(),
            Evaluation::IncludeAndContinue
        );
        assert_eq!(policy.fetch_limit(), Some(3));
        assert_eq!(
            policy.evaluate(&node(ids[0], 4), &local, &transport).await.unwrap(),
            Evaluation::ExcludeAndPrune
        );
    }

    #[tokio::test]
    async fn push_policies_prune_on_remote_presence() {
        let remote = Arc::new(Repository::in_memory());
        let ids = chain(&remote, 1);
        let transport = InProcessTransport::new(remote);
        let local = Repository::in_memory();

        for mut policy in [TransferPolicy::DeepPush, TransferPolicy::ShallowPush] {
            assert_eq!(
                policy.evaluate(&node(ids[0], 1), &local, &transport).await.unwrap(),
                Evaluation::ExcludeAndPrune
            );
        }
    }

    #[tokio::test]
    async fn shallow_push_fails_past_local_boundary() {
        let transport = InProcessTransport::new(Arc::new(Repository::in_memory()));
        let local = Repository::in_memory().with_shallow_depth(1);
        let missing = ObjectId::from_hash([4; 32]);

        let mut policy = TransferPolicy::ShallowPush;
        assert!(matches!(
            policy.evaluate(&node(missing, 2), &local, &transport).await,
            Err(SyncError::HistoryTooShallow(id)) if id == missing
        ));
        assert_eq!(
            policy
                .evaluate(&node(ObjectId::NULL, 1), &local, &transport)
                .await
                .unwrap(),
            Evaluation::IncludeAndContinue
        );
    }
}
