//! In-memory revision graph.
//!
//! Nodes live in a [`HashMap`] keyed by commit id, with a reverse index
//! (`children`) so `In` edges can be answered without a scan. Parents that
//! were never `put` are not nodes; they still appear as edge targets, which
//! is how a shallow boundary looks.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::RwLock;

use strata_types::ObjectId;
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::graph::{Direction, GraphEdge, GraphNode, RevisionGraph};

#[derive(Debug, Default)]
struct GraphState {
    /// Commit id -> ordered parent ids.
    nodes: HashMap<ObjectId, Vec<ObjectId>>,
    /// Parent id -> child ids.
    children: HashMap<ObjectId, Vec<ObjectId>>,
}

impl GraphState {
    fn unlink_parents(&mut self, id: &ObjectId, parents: &[ObjectId]) {
        for parent in parents {
            if let Some(kids) = self.children.get_mut(parent) {
                kids.retain(|c| c != id);
                if kids.is_empty() {
                    self.children.remove(parent);
                }
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRevisionGraph {
    state: RwLock<GraphState>,
}

impl InMemoryRevisionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.nodes.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> GraphResult<std::sync::RwLockReadGuard<'_, GraphState>> {
        self.state
            .read()
            .map_err(|e| GraphError::Storage(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> GraphResult<std::sync::RwLockWriteGuard<'_, GraphState>> {
        self.state
            .write()
            .map_err(|e| GraphError::Storage(format!("lock poisoned: {e}")))
    }
}

impl RevisionGraph for InMemoryRevisionGraph {
    fn get_node(&self, id: &ObjectId) -> GraphResult<Option<GraphNode>> {
        let state = self.read()?;
        Ok(state.nodes.get(id).map(|parents| GraphNode {
            id: *id,
            parents: parents.clone(),
        }))
    }

    fn edges(&self, id: &ObjectId, direction: Direction) -> GraphResult<Vec<GraphEdge>> {
        let state = self.read()?;
        let mut edges = Vec::new();
        if matches!(direction, Direction::Out | Direction::Both) {
            if let Some(parents) = state.nodes.get(id) {
                edges.extend(parents.iter().map(|p| GraphEdge::new(*id, *p)));
            }
        }
        if matches!(direction, Direction::In | Direction::Both) {
            if let Some(kids) = state.children.get(id) {
                edges.extend(kids.iter().map(|c| GraphEdge::new(*c, *id)));
            }
        }
        Ok(edges)
    }

    fn depth(&self, id: &ObjectId) -> GraphResult<u32> {
        let state = self.read()?;
        if !state.nodes.contains_key(id) {
            return Err(GraphError::NodeNotFound(*id));
        }

        let mut visited = HashSet::from([*id]);
        let mut queue = VecDeque::from([(*id, 1u32)]);
        while let Some((current, depth)) = queue.pop_front() {
            let present: Vec<ObjectId> = state
                .nodes
                .get(&current)
                .map(|parents| {
                    parents
                        .iter()
                        .filter(|p| state.nodes.contains_key(p))
                        .copied()
                        .collect()
                })
                .unwrap_or_default();
            if present.is_empty() {
                return Ok(depth);
            }
            for parent in present {
                if visited.insert(parent) {
                    queue.push_back((parent, depth + 1));
                }
            }
        }
        // Every path revisits a node: only possible with a cycle.
        Err(GraphError::CycleDetected(*id))
    }

    fn put(&self, id: &ObjectId, parents: &[ObjectId]) -> GraphResult<bool> {
        if parents.contains(id) {
            return Err(GraphError::CycleDetected(*id));
        }
        let mut state = self.write()?;
        if let Some(existing) = state.nodes.get(id) {
            if existing.as_slice() == parents {
                return Ok(false);
            }
            let old = existing.clone();
            state.unlink_parents(id, &old);
        }

        for parent in parents {
            let kids = state.children.entry(*parent).or_default();
            if !kids.contains(id) {
                kids.push(*id);
            }
        }
        state.nodes.insert(*id, parents.to_vec());
        debug!(commit = %id.short_hex(), parents = parents.len(), "graph node recorded");
        Ok(true)
    }

    fn remove(&self, id: &ObjectId) -> GraphResult<bool> {
        let mut state = self.write()?;
        let Some(parents) = state.nodes.remove(id) else {
            return Ok(false);
        };
        state.unlink_parents(id, &parents);
        debug!(commit = %id.short_hex(), "graph node removed");
        Ok(true)
    }
}
