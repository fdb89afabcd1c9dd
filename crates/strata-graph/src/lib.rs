//! Commit revision graph for Strata.
//!
//! The [`RevisionGraph`] mirrors the parent pointers embedded in stored
//! commits: one node per commit, `Out` edges toward parents. It answers the
//! structural questions the sync engine asks (parents, depth from a shallow
//! boundary) without parsing commit objects, and backs the
//! [`AncestorResolver`].

pub mod ancestor;
pub mod error;
pub mod graph;
pub mod memory;

pub use ancestor::{find_common_ancestor, AncestorResolver};
pub use error::{GraphError, GraphResult};
pub use graph::{Direction, GraphEdge, GraphNode, RevisionGraph};
pub use memory::InMemoryRevisionGraph;
