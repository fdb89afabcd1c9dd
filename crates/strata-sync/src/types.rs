use serde::{Deserialize, Serialize};
use strata_types::ObjectId;

/// Summary of a completed fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchReport {
    /// The remote commit the fetch started from. Local refs are not moved;
    /// pointing a ref here is up to the caller.
    pub tip: ObjectId,
    pub commits_applied: usize,
    pub commits_pruned: usize,
    pub objects_received: usize,
    /// The depth limit in effect at the end of the walk, explicit or derived
    /// from local history. `None` for an unbounded fetch.
    pub fetch_limit: Option<u32>,
}

impl FetchReport {
    /// True when nothing had to be transferred.
    pub fn is_up_to_date(&self) -> bool {
        self.objects_received == 0
    }
}

/// Summary of a completed push.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushReport {
    pub refspec: String,
    pub new_id: ObjectId,
    /// The remote ref's value before the push; `None` if it was created.
    pub previous_id: Option<ObjectId>,
    pub commits_applied: usize,
    pub objects_sent: usize,
}

impl PushReport {
    pub fn created_ref(&self) -> bool {
        self.previous_id.is_none()
    }
}
