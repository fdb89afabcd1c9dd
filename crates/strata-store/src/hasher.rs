use strata_types::ObjectId;

use crate::object::ObjectKind;

/// Domain-separated BLAKE3 hasher.
///
/// The domain tag is prepended to the payload before hashing, so a commit
/// and a feature with byte-identical payloads never share an id.
#[derive(Clone, Copy, Debug)]
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    pub const COMMIT: Self = Self::new("strata-commit-v1");
    pub const TREE: Self = Self::new("strata-tree-v1");
    pub const FEATURE: Self = Self::new("strata-feature-v1");
    pub const FEATURE_TYPE: Self = Self::new("strata-featuretype-v1");

    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// The hasher used for objects of `kind`.
    pub const fn for_kind(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Commit => Self::COMMIT,
            ObjectKind::Tree => Self::TREE,
            ObjectKind::Feature => Self::FEATURE,
            ObjectKind::FeatureType => Self::FEATURE_TYPE,
        }
    }

    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    pub fn domain(&self) -> &str {
        self.domain
    }
}
