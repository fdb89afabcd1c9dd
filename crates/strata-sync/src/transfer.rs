//! Moving a commit and the objects it references between repositories.

use std::collections::HashSet;

use strata_diff::diff_trees;
use strata_store::{ObjectKind, RevCommit, RevObject, RevTree};
use strata_types::ObjectId;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult, TransportError};
use crate::repository::Repository;
use crate::transport::{RemoteTransport, SendOutcome, TransferDirection};

/// Applies included commits for a walk in one direction.
///
/// When fetching it records every object and graph node it creates locally,
/// so a failed fetch can be undone with [`ObjectMover::rollback`].
pub struct ObjectMover<'a> {
    local: &'a Repository,
    transport: &'a dyn RemoteTransport,
    direction: TransferDirection,
    /// Ids known to be present at the destination.
    present: HashSet<ObjectId>,
    written: Vec<ObjectId>,
    graph_nodes: Vec<ObjectId>,
    moved: usize,
}

impl<'a> ObjectMover<'a> {
    pub fn new(
        local: &'a Repository,
        transport: &'a dyn RemoteTransport,
        direction: TransferDirection,
    ) -> Self {
        Self {
            local,
            transport,
            direction,
            present: HashSet::new(),
            written: Vec::new(),
            graph_nodes: Vec::new(),
            moved: 0,
        }
    }

    pub fn direction(&self) -> TransferDirection {
        self.direction
    }

    /// Objects newly written to the local store by this mover.
    pub fn written(&self) -> &[ObjectId] {
        &self.written
    }

    /// Objects actually transferred, in either direction.
    pub fn objects_moved(&self) -> usize {
        self.moved
    }

    /// Move `commit`, its tree, and the objects the destination is missing.
    pub async fn apply(&mut self, commit_id: &ObjectId) -> SyncResult<()> {
        match self.direction {
            TransferDirection::Fetch => self.fetch_commit(commit_id).await,
            TransferDirection::Push => self.push_commit(commit_id).await,
        }
    }

    async fn fetch_commit(&mut self, id: &ObjectId) -> SyncResult<()> {
        if self.local.objects().exists(id)? {
            debug!(commit = %id.short_hex(), "commit already present");
            return Ok(());
        }
        match self.transport.get_object(id, self.local.objects()).await {
            Ok(created) => self.record_written(id, created),
            // The remote ran out of history before we did.
            Err(TransportError::ObjectNotFound(missing)) => {
                return Err(SyncError::HistoryTooShallow(missing))
            }
            Err(e) => return Err(e.into()),
        }
        let commit = self.load_commit(id)?;
        if !self.local.graph().exists(id)? {
            self.local.graph().put(id, &commit.parent_ids)?;
            self.graph_nodes.push(*id);
        }
        self.fetch_tree(&commit.tree_id).await?;
        debug!(commit = %id.short_hex(), "commit fetched");
        Ok(())
    }

    /// Content goes first and the commit last, so a commit present on the
    /// remote always has its tree and features there too. A push that fails
    /// part way leaves no commit that a later push would wrongly skip.
    async fn push_commit(&mut self, id: &ObjectId) -> SyncResult<()> {
        let commit = self.load_commit(id)?;
        self.push_changed_features(&commit).await?;
        self.push_tree(&commit.tree_id).await?;
        self.send(id).await?;
        self.present.insert(*id);
        debug!(commit = %id.short_hex(), "commit pushed");
        Ok(())
    }

    /// Walk a tree, fetching every object the local store lacks. A subtree
    /// already present locally is complete and is not descended.
    async fn fetch_tree(&mut self, root: &ObjectId) -> SyncResult<()> {
        let mut pending = vec![*root];
        while let Some(tree_id) = pending.pop() {
            if !self.move_object(&tree_id).await? {
                continue;
            }
            let tree = self.load_tree(&tree_id)?;
            if let Some(buckets) = tree.buckets() {
                pending.extend(buckets.values().map(|b| b.id));
                continue;
            }
            for node in tree.children() {
                if let Some(metadata) = node.metadata_id {
                    self.move_object(&metadata).await?;
                }
                if node.is_tree() {
                    pending.push(node.object_id);
                } else {
                    self.move_object(&node.object_id).await?;
                }
            }
        }
        Ok(())
    }

    /// Send the tree structure the remote lacks, children before parents.
    /// A tree the remote already has is complete there and is not descended.
    /// Features are not sent here; they come from the commit's diff.
    async fn push_tree(&mut self, root: &ObjectId) -> SyncResult<()> {
        let mut stack = vec![(*root, false)];
        while let Some((tree_id, expanded)) = stack.pop() {
            if tree_id.is_null() || self.present.contains(&tree_id) {
                continue;
            }
            if expanded {
                self.send(&tree_id).await?;
                self.present.insert(tree_id);
                continue;
            }
            if self.transport.object_exists(&tree_id).await? {
                self.present.insert(tree_id);
                continue;
            }
            let tree = self.load_tree(&tree_id)?;
            stack.push((tree_id, true));
            if let Some(buckets) = tree.buckets() {
                stack.extend(buckets.values().map(|b| (b.id, false)));
                continue;
            }
            for node in tree.children() {
                if let Some(metadata) = node.metadata_id {
                    self.move_object(&metadata).await?;
                }
                if node.is_tree() {
                    stack.push((node.object_id, false));
                }
            }
        }
        Ok(())
    }

    async fn push_changed_features(&mut self, commit: &RevCommit) -> SyncResult<()> {
        let parent_tree = match commit.first_parent() {
            Some(parent) => match self.local.objects().get(parent)? {
                Some(RevObject::Commit(p)) => Some(p.tree_id),
                _ => None,
            },
            None => None,
        };
        let changes = diff_trees(self.local.objects(), parent_tree.as_ref(), &commit.tree_id)?;
        for change in changes {
            let Some(new) = change.new else { continue };
            self.move_object(&new.object_id()).await?;
            if let Some(metadata) = new.metadata_id() {
                self.move_object(&metadata).await?;
            }
        }
        Ok(())
    }

    /// Move one object if the destination lacks it. Returns `true` if the
    /// destination did not have it before.
    async fn move_object(&mut self, id: &ObjectId) -> SyncResult<bool> {
        if id.is_null() || self.present.contains(id) {
            return Ok(false);
        }
        let moved = match self.direction {
            TransferDirection::Fetch => {
                if self.local.objects().exists(id)? {
                    false
                } else {
                    let created = self.transport.get_object(id, self.local.objects()).await?;
                    self.record_written(id, created);
                    true
                }
            }
            TransferDirection::Push => {
                if self.transport.object_exists(id).await? {
                    false
                } else {
                    self.send(id).await?;
                    true
                }
            }
        };
        self.present.insert(*id);
        Ok(moved)
    }

    async fn send(&mut self, id: &ObjectId) -> SyncResult<()> {
        if self.transport.send_object(id, self.local.objects()).await? == SendOutcome::Sent {
            self.moved += 1;
        }
        Ok(())
    }

    fn record_written(&mut self, id: &ObjectId, created: bool) {
        if created {
            self.written.push(*id);
            self.moved += 1;
        }
    }

    fn load(&self, id: &ObjectId) -> SyncResult<RevObject> {
        self.local
            .objects()
            .get(id)?
            .ok_or(SyncError::MissingObject(*id))
    }

    fn load_commit(&self, id: &ObjectId) -> SyncResult<RevCommit> {
        match self.load(id)? {
            RevObject::Commit(commit) => Ok(commit),
            other => Err(SyncError::UnexpectedObject {
                id: *id,
                expected: ObjectKind::Commit,
                actual: other.kind(),
            }),
        }
    }

    fn load_tree(&self, id: &ObjectId) -> SyncResult<RevTree> {
        match self.load(id)? {
            RevObject::Tree(tree) => Ok(tree),
            other => Err(SyncError::UnexpectedObject {
                id: *id,
                expected: ObjectKind::Tree,
                actual: other.kind(),
            }),
        }
    }

    /// Undo a fetch: delete every object this mover wrote and every graph
    /// node it added. Returns the number of objects deleted.
    pub fn rollback(&mut self) -> SyncResult<usize> {
        let mut deleted = 0;
        for id in self.written.drain(..).rev() {
            if self.local.objects().delete(&id)? {
                deleted += 1;
            }
        }
        for id in self.graph_nodes.drain(..).rev() {
            self.local.graph().remove(&id)?;
        }
        self.present.clear();
        warn!(deleted, "fetch rolled back");
        Ok(deleted)
    }
}
