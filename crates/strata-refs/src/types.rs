//! Core reference types.

use serde::{Deserialize, Serialize};
use strata_types::ObjectId;

pub const HEAD: &str = "HEAD";
pub const HEADS_PREFIX: &str = "refs/heads/";
pub const TAGS_PREFIX: &str = "refs/tags/";
pub const REMOTES_PREFIX: &str = "refs/remotes/";

/// A named pointer, resolved to the commit it designates.
///
/// A symbolic ref carries the name of the direct ref it points at together
/// with that ref's current value, which is how refs are listed and exchanged
/// with remotes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ref {
    Direct {
        name: String,
        object_id: ObjectId,
    },
    Symbolic {
        name: String,
        target: String,
        object_id: ObjectId,
    },
}

impl Ref {
    pub fn direct(name: impl Into<String>, object_id: ObjectId) -> Self {
        Self::Direct {
            name: name.into(),
            object_id,
        }
    }

    /// A symbolic ref to `target`. If `target` is itself symbolic, the new
    /// ref points at what `target` points at.
    pub fn symbolic(name: impl Into<String>, target: &Ref) -> Self {
        let peeled = target.peel();
        Self::Symbolic {
            name: name.into(),
            target: peeled.name().to_string(),
            object_id: peeled.object_id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Direct { name, .. } | Self::Symbolic { name, .. } => name,
        }
    }

    /// The commit this ref designates, through its target if symbolic.
    pub fn object_id(&self) -> ObjectId {
        match self {
            Self::Direct { object_id, .. } | Self::Symbolic { object_id, .. } => *object_id,
        }
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Direct { .. } => None,
            Self::Symbolic { target, .. } => Some(target),
        }
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self, Self::Symbolic { .. })
    }

    /// The direct ref this ref resolves to.
    pub fn peel(&self) -> Ref {
        match self {
            Self::Direct { .. } => self.clone(),
            Self::Symbolic {
                target, object_id, ..
            } => Self::direct(target.clone(), *object_id),
        }
    }

    pub fn is_branch(&self) -> bool {
        self.name().starts_with(HEADS_PREFIX)
    }

    pub fn is_tag(&self) -> bool {
        self.name().starts_with(TAGS_PREFIX)
    }

    /// Name without its namespace prefix (`refs/heads/main` -> `main`).
    pub fn short_name(&self) -> &str {
        let name = self.name();
        [HEADS_PREFIX, TAGS_PREFIX, REMOTES_PREFIX]
            .iter()
            .find_map(|p| name.strip_prefix(p))
            .unwrap_or(name)
    }
}

impl std::fmt::Display for Ref {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct { name, object_id } => write!(f, "{name} -> {}", object_id.short_hex()),
            Self::Symbolic {
                name,
                target,
                object_id,
            } => write!(f, "{name} -> {target} -> {}", object_id.short_hex()),
        }
    }
}
