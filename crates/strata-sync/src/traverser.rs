//! Policy-driven breadth-first walk over commit history.

use std::collections::{HashMap, HashSet, VecDeque};

use strata_types::ObjectId;
use tracing::{debug, trace};

use crate::error::SyncResult;
use crate::policy::TransferPolicy;
use crate::repository::Repository;
use crate::transfer::ObjectMover;
use crate::transport::{RemoteTransport, TransferDirection};

/// A commit reached by the walk. The starting commit has depth 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitNode {
    pub id: ObjectId,
    pub depth: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Evaluation {
    /// Apply this commit and walk on to its parents.
    IncludeAndContinue,
    /// Skip this commit and everything only reachable through it.
    ExcludeAndPrune,
}

/// Lifecycle of a commit during a walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeState {
    Pending,
    Evaluated(Evaluation),
    Applied,
    Done,
}

/// Outcome of a walk.
#[derive(Clone, Debug, Default)]
pub struct Traversal {
    /// Included commits in the order they were applied.
    pub applied: Vec<ObjectId>,
    pub pruned: Vec<ObjectId>,
    states: HashMap<ObjectId, NodeState>,
}

impl Traversal {
    pub fn state(&self, id: &ObjectId) -> Option<NodeState> {
        self.states.get(id).copied()
    }
}

pub struct CommitTraverser<'a> {
    local: &'a Repository,
    transport: &'a dyn RemoteTransport,
}

impl<'a> CommitTraverser<'a> {
    pub fn new(local: &'a Repository, transport: &'a dyn RemoteTransport) -> Self {
        Self { local, transport }
    }

    /// Walk from `start`, evaluating each commit with `policy` and handing
    /// included ones to `mover`.
    ///
    /// A fetch applies each commit as it is reached, since its parents are
    /// only known locally once it has been applied. A push evaluates the
    /// whole walk first and then applies parents before children, so any
    /// commit that reached the remote has its ancestry there as well.
    ///
    /// Stops at the first error; objects already moved stay moved.
    pub async fn traverse(
        &self,
        start: ObjectId,
        policy: &mut TransferPolicy,
        mover: &mut ObjectMover<'_>,
    ) -> SyncResult<Traversal> {
        let mut traversal = Traversal::default();
        if start.is_null() {
            return Ok(traversal);
        }

        let deferred_apply = mover.direction() == TransferDirection::Push;
        let mut included: Vec<ObjectId> = Vec::new();
        let mut queue = VecDeque::from([CommitNode { id: start, depth: 1 }]);
        let mut seen = HashSet::from([start]);
        traversal.states.insert(start, NodeState::Pending);

        while let Some(node) = queue.pop_front() {
            let evaluation = policy.evaluate(&node, self.local, self.transport).await?;
            trace!(commit = %node.id.short_hex(), depth = node.depth, ?evaluation, "evaluated");
            traversal
                .states
                .insert(node.id, NodeState::Evaluated(evaluation));

            if evaluation == Evaluation::ExcludeAndPrune {
                traversal.pruned.push(node.id);
                traversal.states.insert(node.id, NodeState::Done);
                continue;
            }

            if deferred_apply {
                included.push(node.id);
            } else {
                mover.apply(&node.id).await?;
                traversal.states.insert(node.id, NodeState::Applied);
                traversal.applied.push(node.id);
                traversal.states.insert(node.id, NodeState::Done);
            }

            for parent in self.local.graph().parents(&node.id)? {
                if parent.is_null() || !seen.insert(parent) {
                    continue;
                }
                traversal.states.insert(parent, NodeState::Pending);
                queue.push_back(CommitNode {
                    id: parent,
                    depth: node.depth + 1,
                });
            }
        }

        for id in self.parents_first(&included)? {
            mover.apply(&id).await?;
            traversal.states.insert(id, NodeState::Applied);
            traversal.applied.push(id);
            traversal.states.insert(id, NodeState::Done);
        }

        debug!(
            applied = traversal.applied.len(),
            pruned = traversal.pruned.len(),
            "traversal complete"
        );
        Ok(traversal)
    }

    /// Order `ids` so each commit follows those of its parents in `ids`.
    fn parents_first(&self, ids: &[ObjectId]) -> SyncResult<Vec<ObjectId>> {
        let members: HashSet<ObjectId> = ids.iter().copied().collect();
        let mut placed: HashSet<ObjectId> = HashSet::with_capacity(ids.len());
        let mut ordered = Vec::with_capacity(ids.len());
        for id in ids {
            let mut stack = vec![(*id, false)];
            while let Some((current, expanded)) = stack.pop() {
                if placed.contains(&current) {
                    continue;
                }
                if expanded {
                    placed.insert(current);
                    ordered.push(current);
                    continue;
                }
                stack.push((current, true));
                for parent in self.local.graph().parents(&current)? {
                    if members.contains(&parent) && !placed.contains(&parent) {
                        stack.push((parent, false));
                    }
                }
            }
        }
        Ok(ordered)
    }
}
