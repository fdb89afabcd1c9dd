use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strata_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::hasher::ContentHasher;

/// The kind of a stored object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Commit,
    Tree,
    Feature,
    FeatureType,
}

impl ObjectKind {
    /// Leading byte of the raw encoding.
    pub const fn tag(self) -> u8 {
        match self {
            Self::Commit => 1,
            Self::Tree => 2,
            Self::Feature => 3,
            Self::FeatureType => 4,
        }
    }

    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Commit),
            2 => Some(Self::Tree),
            3 => Some(Self::Feature),
            4 => Some(Self::FeatureType),
            _ => None,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Commit => write!(f, "commit"),
            Self::Tree => write!(f, "tree"),
            Self::Feature => write!(f, "feature"),
            Self::FeatureType => write!(f, "featuretype"),
        }
    }
}

/// The unit of storage: a kind tag plus the canonical payload.
///
/// The store never interprets `data`. The raw form exchanged with remotes is
/// the kind tag byte followed by the payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub data: Vec<u8>,
}

impl StoredObject {
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    /// Content-addressed id: domain-separated hash of the payload.
    pub fn compute_id(&self) -> ObjectId {
        ContentHasher::for_kind(self.kind).hash(&self.data)
    }

    pub fn to_raw(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(self.data.len() + 1);
        raw.push(self.kind.tag());
        raw.extend_from_slice(&self.data);
        raw
    }

    /// Decode the raw form. `id` is only used to label errors.
    pub fn from_raw(id: &ObjectId, raw: &[u8]) -> StoreResult<Self> {
        let (&tag, data) = raw.split_first().ok_or_else(|| StoreError::CorruptObject {
            id: *id,
            reason: "empty object body".into(),
        })?;
        let kind = ObjectKind::from_tag(tag).ok_or_else(|| StoreError::CorruptObject {
            id: *id,
            reason: format!("unknown object kind tag {tag}"),
        })?;
        Ok(Self::new(kind, data.to_vec()))
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// A commit: a root tree plus ordered parent commits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevCommit {
    pub tree_id: ObjectId,
    pub parent_ids: Vec<ObjectId>,
    pub author: String,
    pub message: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
}

impl RevCommit {
    pub fn new(
        tree_id: ObjectId,
        parent_ids: Vec<ObjectId>,
        author: impl Into<String>,
        message: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            tree_id,
            parent_ids,
            author: author.into(),
            message: message.into(),
            timestamp,
        }
    }

    pub fn first_parent(&self) -> Option<&ObjectId> {
        self.parent_ids.first()
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// What a [`Node`] points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Tree,
    Feature,
}

/// A named entry inside a tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub object_id: ObjectId,
    pub kind: NodeKind,
    /// Feature type describing this entry, if it overrides the tree default.
    pub metadata_id: Option<ObjectId>,
}

impl Node {
    pub fn tree(name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            name: name.into(),
            object_id,
            kind: NodeKind::Tree,
            metadata_id: None,
        }
    }

    pub fn feature(name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            name: name.into(),
            object_id,
            kind: NodeKind::Feature,
            metadata_id: None,
        }
    }

    pub fn with_metadata(mut self, metadata_id: ObjectId) -> Self {
        self.metadata_id = Some(metadata_id);
        self
    }

    pub fn is_tree(&self) -> bool {
        self.kind == NodeKind::Tree
    }
}

/// A pointer to a hashed partition of a large tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub id: ObjectId,
}

/// A tree holds either its children directly or, when large, a fixed set of
/// buckets each naming another tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "lowercase")]
pub enum TreeContents {
    Leaf { children: Vec<Node> },
    Buckets { buckets: BTreeMap<u32, Bucket> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevTree {
    pub contents: TreeContents,
}

impl RevTree {
    pub fn empty() -> Self {
        Self::leaf(Vec::new())
    }

    /// A tree holding `children` directly, sorted by name.
    pub fn leaf(mut children: Vec<Node>) -> Self {
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            contents: TreeContents::Leaf { children },
        }
    }

    pub fn bucketed(buckets: BTreeMap<u32, Bucket>) -> Self {
        Self {
            contents: TreeContents::Buckets { buckets },
        }
    }

    /// Direct children; empty for a bucketed tree.
    pub fn children(&self) -> &[Node] {
        match &self.contents {
            TreeContents::Leaf { children } => children,
            TreeContents::Buckets { .. } => &[],
        }
    }

    pub fn buckets(&self) -> Option<&BTreeMap<u32, Bucket>> {
        match &self.contents {
            TreeContents::Leaf { .. } => None,
            TreeContents::Buckets { buckets } => Some(buckets),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.children()
            .binary_search_by(|n| n.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.children()[i])
    }
}

/// A [`Node`] located at a path, as produced by tree walks and diffs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeRef {
    pub parent_path: String,
    pub node: Node,
    /// Metadata of the enclosing tree entry, inherited when the node has none.
    pub default_metadata_id: Option<ObjectId>,
}

impl NodeRef {
    pub fn new(parent_path: impl Into<String>, node: Node, default_metadata_id: Option<ObjectId>) -> Self {
        Self {
            parent_path: parent_path.into(),
            node,
            default_metadata_id,
        }
    }

    pub fn path(&self) -> String {
        child_path(&self.parent_path, &self.node.name)
    }

    pub fn object_id(&self) -> ObjectId {
        self.node.object_id
    }

    pub fn metadata_id(&self) -> Option<ObjectId> {
        self.node.metadata_id.or(self.default_metadata_id)
    }
}

/// Join a parent path and a child name with `/`.
pub fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

// ---------------------------------------------------------------------------
// Leaves
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevFeature {
    pub values: Vec<serde_json::Value>,
}

impl RevFeature {
    pub fn new(values: Vec<serde_json::Value>) -> Self {
        Self { values }
    }
}

/// Schema metadata: a type name and its attribute names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevFeatureType {
    pub name: String,
    pub attributes: Vec<String>,
}

// ---------------------------------------------------------------------------
// RevObject
// ---------------------------------------------------------------------------

/// Any stored revision object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevObject {
    Commit(RevCommit),
    Tree(RevTree),
    Feature(RevFeature),
    FeatureType(RevFeatureType),
}

impl RevObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Commit(_) => ObjectKind::Commit,
            Self::Tree(_) => ObjectKind::Tree,
            Self::Feature(_) => ObjectKind::Feature,
            Self::FeatureType(_) => ObjectKind::FeatureType,
        }
    }

    /// Encode to the canonical stored form.
    pub fn to_stored(&self) -> StoreResult<StoredObject> {
        let data = match self {
            Self::Commit(c) => serde_json::to_vec(c),
            Self::Tree(t) => serde_json::to_vec(t),
            Self::Feature(f) => serde_json::to_vec(f),
            Self::FeatureType(t) => serde_json::to_vec(t),
        }
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoredObject::new(self.kind(), data))
    }

    pub fn from_stored(id: &ObjectId, stored: &StoredObject) -> StoreResult<Self> {
        let corrupt = |e: serde_json::Error| StoreError::CorruptObject {
            id: *id,
            reason: e.to_string(),
        };
        let data = &stored.data;
        Ok(match stored.kind {
            ObjectKind::Commit => Self::Commit(serde_json::from_slice(data).map_err(corrupt)?),
            ObjectKind::Tree => Self::Tree(serde_json::from_slice(data).map_err(corrupt)?),
            ObjectKind::Feature => Self::Feature(serde_json::from_slice(data).map_err(corrupt)?),
            ObjectKind::FeatureType => {
                Self::FeatureType(serde_json::from_slice(data).map_err(corrupt)?)
            }
        })
    }

    pub fn id(&self) -> StoreResult<ObjectId> {
        Ok(self.to_stored()?.compute_id())
    }

    pub fn as_commit(&self) -> Option<&RevCommit> {
        match self {
            Self::Commit(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&RevTree> {
        match self {
            Self::Tree(t) => Some(t),
            _ => None,
        }
    }
}

impl From<RevCommit> for RevObject {
    fn from(c: RevCommit) -> Self {
        Self::Commit(c)
    }
}

impl From<RevTree> for RevObject {
    fn from(t: RevTree) -> Self {
        Self::Tree(t)
    }
}

impl From<RevFeature> for RevObject {
    fn from(f: RevFeature) -> Self {
        Self::Feature(f)
    }
}

impl From<RevFeatureType> for RevObject {
    fn from(t: RevFeatureType) -> Self {
        Self::FeatureType(t)
    }
}
