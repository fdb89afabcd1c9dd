//! Checks run before a fetch or push touches anything.
//!
//! Guards are evaluated in order and the first refusal stops the operation.
//! They see the repository and a description of the operation, nothing else.

use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};
use crate::repository::Repository;

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// The operation a guard is asked about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Fetch {
        /// Explicit depth limit requested by the caller.
        fetch_limit: Option<u32>,
        /// The caller asked for the remote's complete history.
        full_depth: bool,
    },
    Push {
        refspec: String,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "fetch",
            Self::Push { .. } => "push",
        }
    }
}

// ---------------------------------------------------------------------------
// GuardDecision
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Refuse(String),
}

impl GuardDecision {
    pub fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed)
    }
}

// ---------------------------------------------------------------------------
// OperationGuard trait
// ---------------------------------------------------------------------------

/// A single precondition on sync operations.
///
/// Object-safe and `Send + Sync` so guards can live in a
/// `Vec<Box<dyn OperationGuard>>`.
pub trait OperationGuard: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, repo: &Repository, op: &Operation) -> GuardDecision;
}

/// Refuses to sync while the repository has unresolved merge conflicts.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConflictGuard;

impl OperationGuard for ConflictGuard {
    fn name(&self) -> &'static str {
        "conflict-guard"
    }

    fn check(&self, repo: &Repository, op: &Operation) -> GuardDecision {
        let conflicts = repo.conflicts();
        if conflicts.is_empty() {
            return GuardDecision::Proceed;
        }
        GuardDecision::Refuse(format!(
            "cannot {} with {} unresolved conflict(s), first: {}",
            op.name(),
            conflicts.len(),
            conflicts[0]
        ))
    }
}

/// Depth options only make sense for a shallow clone.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShallowDepthGuard;

impl OperationGuard for ShallowDepthGuard {
    fn name(&self) -> &'static str {
        "shallow-depth-guard"
    }

    fn check(&self, repo: &Repository, op: &Operation) -> GuardDecision {
        match op {
            Operation::Fetch {
                fetch_limit,
                full_depth,
            } if !repo.is_shallow() => {
                if *full_depth {
                    GuardDecision::Refuse(
                        "full-depth fetch requested on a repository that is not shallow".into(),
                    )
                } else if let Some(limit) = fetch_limit {
                    GuardDecision::Refuse(format!(
                        "depth {limit} requested on a repository that is not shallow"
                    ))
                } else {
                    GuardDecision::Proceed
                }
            }
            _ => GuardDecision::Proceed,
        }
    }
}

// ---------------------------------------------------------------------------
// GuardChain
// ---------------------------------------------------------------------------

/// Ordered, fail-fast list of guards.
pub struct GuardChain {
    guards: Vec<Box<dyn OperationGuard>>,
}

impl GuardChain {
    /// An empty chain that lets everything through.
    pub fn new() -> Self {
        Self { guards: Vec::new() }
    }

    /// Append a guard to the end of the chain.
    pub fn with(mut self, guard: impl OperationGuard + 'static) -> Self {
        self.guards.push(Box::new(guard));
        self
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    pub fn check(&self, repo: &Repository, op: &Operation) -> SyncResult<()> {
        for guard in &self.guards {
            if let GuardDecision::Refuse(reason) = guard.check(repo, op) {
                warn!(guard = guard.name(), operation = op.name(), %reason, "operation refused");
                return Err(SyncError::Refused {
                    guard: guard.name(),
                    reason,
                });
            }
        }
        debug!(operation = op.name(), guards = self.guards.len(), "guards passed");
        Ok(())
    }
}

/// [`ConflictGuard`] then [`ShallowDepthGuard`].
impl Default for GuardChain {
    fn default() -> Self {
        Self::new().with(ConflictGuard).with(ShallowDepthGuard)
    }
}

impl std::fmt::Debug for GuardChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.guards.iter().map(|g| g.name()))
            .finish()
    }
}
