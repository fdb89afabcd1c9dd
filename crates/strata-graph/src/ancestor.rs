//! Lowest common ancestor resolution.
//!
//! Two breadth-first frontiers, one per input commit, advance in lock-step.
//! A node dequeued on one side that the other side has already visited is a
//! *potential* common ancestor: its side stops climbing there, and its known
//! ancestors are pruned from the opposite frontier, since nothing above a
//! common ancestor can be a lowest one. Once both frontiers drain, potentials
//! that are ancestors of other potentials are discarded.
//!
//! A DAG can have several lowest common ancestors (criss-cross merges). The
//! resolver returns the one with the smallest [`ObjectId`], which makes the
//! answer independent of discovery order and therefore symmetric in its
//! arguments.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use strata_types::ObjectId;
use tracing::debug;

use crate::error::GraphResult;
use crate::graph::RevisionGraph;

/// Convenience wrapper around [`AncestorResolver::find_common_ancestor`].
pub fn find_common_ancestor(
    graph: &dyn RevisionGraph,
    left: &ObjectId,
    right: &ObjectId,
) -> GraphResult<Option<ObjectId>> {
    AncestorResolver::new(graph).find_common_ancestor(left, right)
}

pub struct AncestorResolver<'g> {
    graph: &'g dyn RevisionGraph,
}

/// One side of the bidirectional search.
#[derive(Default)]
struct Frontier {
    queue: VecDeque<ObjectId>,
    visited: HashSet<ObjectId>,
}

impl Frontier {
    fn starting_at(id: ObjectId) -> Self {
        Self {
            queue: VecDeque::from([id]),
            visited: HashSet::new(),
        }
    }
}

impl<'g> AncestorResolver<'g> {
    pub fn new(graph: &'g dyn RevisionGraph) -> Self {
        Self { graph }
    }

    /// The lowest common ancestor of `left` and `right`, if they share
    /// history. Equal inputs return immediately without touching the graph.
    pub fn find_common_ancestor(
        &self,
        left: &ObjectId,
        right: &ObjectId,
    ) -> GraphResult<Option<ObjectId>> {
        if left == right {
            return Ok(Some(*left));
        }

        let mut lhs = Frontier::starting_at(*left);
        let mut rhs = Frontier::starting_at(*right);
        let mut potentials: Vec<ObjectId> = Vec::new();

        while !lhs.queue.is_empty() || !rhs.queue.is_empty() {
            if let Some(id) = lhs.queue.pop_front() {
                if self.process(id, &mut lhs, &mut rhs)? {
                    potentials.push(id);
                }
            }
            if let Some(id) = rhs.queue.pop_front() {
                if self.process(id, &mut rhs, &mut lhs)? {
                    potentials.push(id);
                }
            }
        }

        let lowest = self.discard_dominated(&potentials)?;
        let chosen = lowest.iter().next().copied();
        debug!(
            left = %left.short_hex(),
            right = %right.short_hex(),
            candidates = lowest.len(),
            ancestor = ?chosen,
            "common ancestor resolved"
        );
        Ok(chosen)
    }

    /// Visit `id` on `mine`. Returns `true` if it is a potential common
    /// ancestor.
    fn process(&self, id: ObjectId, mine: &mut Frontier, theirs: &mut Frontier) -> GraphResult<bool> {
        if !mine.visited.insert(id) {
            return Ok(false);
        }
        if theirs.visited.contains(&id) {
            self.stop_ancestry_path(id, theirs)?;
            return Ok(true);
        }
        mine.queue.extend(self.graph.parents(&id)?);
        Ok(false)
    }

    /// Remove the known ancestors of a common ancestor from the opposite
    /// frontier. The walk follows nodes the opposite side has visited and
    /// prunes the queued nodes at its edge.
    fn stop_ancestry_path(&self, id: ObjectId, theirs: &mut Frontier) -> GraphResult<()> {
        let mut walk = VecDeque::from([id]);
        let mut seen = HashSet::from([id]);
        while let Some(current) = walk.pop_front() {
            for parent in self.graph.parents(&current)? {
                if !seen.insert(parent) {
                    continue;
                }
                theirs.queue.retain(|q| *q != parent);
                if theirs.visited.contains(&parent) {
                    walk.push_back(parent);
                }
            }
        }
        Ok(())
    }

    /// Drop every potential that is a proper ancestor of another potential.
    ///
    /// The walk climbs from all potentials at once and records, per node,
    /// which potentials it descends from. A potential reached from another
    /// one is dominated. A node that descends from every surviving potential
    /// cannot have a survivor above it, so the walk stops there instead of
    /// running on to the root.
    fn discard_dominated(&self, potentials: &[ObjectId]) -> GraphResult<BTreeSet<ObjectId>> {
        let mut survivors: BTreeSet<ObjectId> = potentials.iter().copied().collect();
        if survivors.len() < 2 {
            return Ok(survivors);
        }

        let mut reached_from: HashMap<ObjectId, BTreeSet<ObjectId>> = survivors
            .iter()
            .map(|id| (*id, BTreeSet::from([*id])))
            .collect();
        let mut parents: HashMap<ObjectId, Vec<ObjectId>> = HashMap::new();
        let mut walk: VecDeque<ObjectId> = survivors.iter().copied().collect();

        while let Some(current) = walk.pop_front() {
            if survivors.len() < 2 {
                break;
            }
            let from = reached_from.get(&current).cloned().unwrap_or_default();
            if survivors.is_subset(&from) {
                continue;
            }
            if !parents.contains_key(&current) {
                parents.insert(current, self.graph.parents(&current)?);
            }
            for parent in parents.get(&current).into_iter().flatten() {
                let entry = reached_from.entry(*parent).or_default();
                let before = entry.len();
                entry.extend(from.iter().copied());
                if entry.len() == before {
                    continue;
                }
                survivors.remove(parent);
                walk.push_back(*parent);
            }
        }
        Ok(survivors)
    }
}
