//! The [`RevisionGraph`] storage interface.

use strata_types::ObjectId;

use crate::error::GraphResult;

/// Edge direction relative to a node. `Out` points toward ancestors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Out,
    In,
    Both,
}

/// A parent relation: `from` is the child commit, `to` is its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GraphEdge {
    pub from: ObjectId,
    pub to: ObjectId,
}

impl GraphEdge {
    pub fn new(from: ObjectId, to: ObjectId) -> Self {
        Self { from, to }
    }

    /// The endpoint that is not `id`.
    pub fn opposite(&self, id: &ObjectId) -> ObjectId {
        if self.from == *id {
            self.to
        } else {
            self.from
        }
    }
}

/// The graph's view of one commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphNode {
    pub id: ObjectId,
    /// Parent ids in commit order. A parent need not itself be a node when
    /// the local history is shallow.
    pub parents: Vec<ObjectId>,
}

impl GraphNode {
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

/// Persisted DAG of commit ids.
///
/// The graph must mirror the parent pointers of the commits in the object
/// store. Ids that were never `put` behave as nodes without parents.
pub trait RevisionGraph: Send + Sync {
    fn get_node(&self, id: &ObjectId) -> GraphResult<Option<GraphNode>>;

    /// Edges touching `id` in the given direction.
    fn edges(&self, id: &ObjectId, direction: Direction) -> GraphResult<Vec<GraphEdge>>;

    /// Inclusive distance from `id` to the nearest commit none of whose
    /// parents are present (a root or a shallow boundary), which has depth 1.
    fn depth(&self, id: &ObjectId) -> GraphResult<u32>;

    /// Record `id` with its parents. Returns `true` if the graph changed.
    fn put(&self, id: &ObjectId, parents: &[ObjectId]) -> GraphResult<bool>;

    /// Remove a node and its outgoing edges. Returns `true` if it existed.
    fn remove(&self, id: &ObjectId) -> GraphResult<bool>;

    fn exists(&self, id: &ObjectId) -> GraphResult<bool> {
        Ok(self.get_node(id)?.is_some())
    }

    fn parents(&self, id: &ObjectId) -> GraphResult<Vec<ObjectId>> {
        Ok(self
            .edges(id, Direction::Out)?
            .into_iter()
            .map(|e| e.to)
            .collect())
    }

    fn children(&self, id: &ObjectId) -> GraphResult<Vec<ObjectId>> {
        Ok(self
            .edges(id, Direction::In)?
            .into_iter()
            .map(|e| e.from)
            .collect())
    }
}
