//! Recursive tree-to-tree comparison.
//!
//! Only feature nodes are reported. A tree node present on both sides with
//! differing ids is descended into; a tree node present on one side only
//! contributes every feature beneath it as an addition or removal.

use std::collections::BTreeMap;

use strata_store::{child_path, Node, NodeRef, ObjectStore, RevObject};
use strata_types::ObjectId;
use tracing::trace;

use crate::error::{DiffError, DiffResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
}

/// One changed feature: its old and/or new location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffEntry {
    pub old: Option<NodeRef>,
    pub new: Option<NodeRef>,
}

impl DiffEntry {
    pub fn change_type(&self) -> ChangeType {
        match (&self.old, &self.new) {
            (None, _) => ChangeType::Added,
            (_, None) => ChangeType::Removed,
            _ => ChangeType::Modified,
        }
    }

    pub fn path(&self) -> String {
        self.new
            .as_ref()
            .or(self.old.as_ref())
            .map(NodeRef::path)
            .unwrap_or_default()
    }

    pub fn new_object_id(&self) -> Option<ObjectId> {
        self.new.as_ref().map(NodeRef::object_id)
    }

    pub fn old_object_id(&self) -> Option<ObjectId> {
        self.old.as_ref().map(NodeRef::object_id)
    }
}

/// A tree to compare, with the metadata inherited from its enclosing node.
#[derive(Clone, Copy)]
struct Side {
    tree: ObjectId,
    metadata: Option<ObjectId>,
}

/// Compare two trees.
///
/// `old_tree` of `None` (or the null id) compares against the empty tree.
/// Entries come back in path order.
pub fn diff_trees(
    store: &dyn ObjectStore,
    old_tree: Option<&ObjectId>,
    new_tree: &ObjectId,
) -> DiffResult<Vec<DiffEntry>> {
    let old = old_tree.map(|id| Side {
        tree: *id,
        metadata: None,
    });
    let new = Side {
        tree: *new_tree,
        metadata: None,
    };
    let mut out = Vec::new();
    diff_level(store, "", old, Some(new), &mut out)?;
    trace!(changes = out.len(), "tree diff complete");
    Ok(out)
}

fn diff_level(
    store: &dyn ObjectStore,
    path: &str,
    old: Option<Side>,
    new: Option<Side>,
    out: &mut Vec<DiffEntry>,
) -> DiffResult<()> {
    if let (Some(o), Some(n)) = (old, new) {
        if o.tree == n.tree {
            return Ok(());
        }
    }
    let old_nodes = match old {
        Some(side) => load_nodes(store, &side.tree)?,
        None => BTreeMap::new(),
    };
    let new_nodes = match new {
        Some(side) => load_nodes(store, &side.tree)?,
        None => BTreeMap::new(),
    };
    let old_md = old.and_then(|s| s.metadata);
    let new_md = new.and_then(|s| s.metadata);

    let mut names: Vec<&String> = old_nodes.keys().chain(new_nodes.keys()).collect();
    names.sort();
    names.dedup();

    for name in names {
        let o = old_nodes.get(name);
        let n = new_nodes.get(name);
        if o == n {
            continue;
        }
        let child = child_path(path, name);

        let old_subtree = o.filter(|node| node.is_tree()).map(|node| Side {
            tree: node.object_id,
            metadata: node.metadata_id.or(old_md),
        });
        let new_subtree = n.filter(|node| node.is_tree()).map(|node| Side {
            tree: node.object_id,
            metadata: node.metadata_id.or(new_md),
        });
        if old_subtree.is_some() || new_subtree.is_some() {
            diff_level(store, &child, old_subtree, new_subtree, out)?;
        }

        let old_feature = o
            .filter(|node| !node.is_tree())
            .map(|node| NodeRef::new(path, node.clone(), old_md));
        let new_feature = n
            .filter(|node| !node.is_tree())
            .map(|node| NodeRef::new(path, node.clone(), new_md));
        if old_feature.is_some() || new_feature.is_some() {
            out.push(DiffEntry {
                old: old_feature,
                new: new_feature,
            });
        }
    }
    Ok(())
}

/// All nodes of a tree keyed by name, with buckets flattened.
fn load_nodes(store: &dyn ObjectStore, tree_id: &ObjectId) -> DiffResult<BTreeMap<String, Node>> {
    let mut nodes = BTreeMap::new();
    if tree_id.is_null() {
        return Ok(nodes);
    }
    let mut pending = vec![*tree_id];
    while let Some(id) = pending.pop() {
        let tree = match store.get(&id)? {
            Some(RevObject::Tree(tree)) => tree,
            Some(other) => {
                return Err(DiffError::NotATree {
                    id,
                    actual: other.kind().to_string(),
                })
            }
            None => return Err(DiffError::TreeNotFound(id)),
        };
        match tree.buckets() {
            Some(buckets) => pending.extend(buckets.values().map(|b| b.id)),
            None => {
                for node in tree.children() {
                    nodes.insert(node.name.clone(), node.clone());
                }
            }
        }
    }
    Ok(nodes)
}
