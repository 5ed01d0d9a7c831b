//! Resumable checkpoint payload built from unconsumed frontier frames.
//!
//! The payload is a plain data-transfer object: the caller stores it opaquely
//! and passes it back verbatim to continue a stopped scan.

use serde::{Deserialize, Serialize};

/// Most pending directories persisted into one checkpoint.
pub const CHECKPOINT_DIR_CAP: usize = 50_000;

/// One directory that was discovered but never listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDir {
    /// Directory path.
    pub path: String,
    /// Depth the directory had on the frontier.
    pub depth: u32,
}

/// Snapshot of unfinished frontier work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Checkpoint {
    /// Directories to seed the next invocation's frontier with.
    pub pending_dirs: Vec<PendingDir>,
    /// Whether the pending list was cut at [`CHECKPOINT_DIR_CAP`].
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
    /// Number of pending directories dropped by truncation.
    #[serde(skip_serializing_if = "is_zero")]
    pub remaining_count: u64,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl Checkpoint {
    /// Build a checkpoint from leftover frames, or `None` when none remain.
    ///
    /// Frame order is preserved so a resumed frontier pops in the same
    /// depth-first order the stopped scan would have.
    #[must_use]
    pub fn from_pending(mut pending: Vec<PendingDir>) -> Option<Self> {
        if pending.is_empty() {
            return None;
        }
        let total = pending.len();
        let truncated = total > CHECKPOINT_DIR_CAP;
        if truncated {
            pending.truncate(CHECKPOINT_DIR_CAP);
        }
        Some(Self {
            pending_dirs: pending,
            truncated,
            remaining_count: (total - total.min(CHECKPOINT_DIR_CAP)) as u64,
        })
    }

    /// Whether the checkpoint carries no resumable work.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending_dirs.is_empty()
    }
}
