//! Push sessions held by the receiving side.
//!
//! A client brackets its uploads with `begin` and `end`; the ref it pushes
//! is only moved at `end`, and only if nobody moved it in between.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use strata_refs::{Ref, RefError, RefStore};
use strata_types::ObjectId;
use tracing::{debug, warn};

use crate::error::SessionError;

#[derive(Debug, Default)]
pub struct PushSessions {
    open: Mutex<HashSet<String>>,
}

impl PushSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for `client`, replacing any session it left open.
    pub fn begin(&self, client: &str) {
        self.open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(client.to_string());
        debug!(client, "push session opened");
    }

    pub fn is_open(&self, client: &str) -> bool {
        self.open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(client)
    }

    /// Close `client`'s session and swap `refspec` from `original` to `new`.
    ///
    /// The session is closed whether or not the swap succeeds.
    pub fn end(
        &self,
        client: &str,
        refs: &dyn RefStore,
        refspec: &str,
        new: ObjectId,
        original: Option<ObjectId>,
    ) -> Result<Ref, SessionError> {
        let was_open = self
            .open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(client);
        if !was_open {
            return Err(SessionError::NoSession {
                client: client.to_string(),
            });
        }

        match refs.compare_and_swap(refspec, original, new) {
            Ok(updated) => {
                debug!(client, refspec, to = %new.short_hex(), "push session closed");
                Ok(updated)
            }
            Err(RefError::Conflict { actual, .. }) => {
                warn!(
                    client,
                    refspec,
                    actual = ?actual.map(|a| a.short_hex()),
                    "ref moved during push"
                );
                Err(SessionError::ConcurrentUpdate {
                    refspec: refspec.to_string(),
                })
            }
            Err(e) => Err(SessionError::Refs(e)),
        }
    }
}
