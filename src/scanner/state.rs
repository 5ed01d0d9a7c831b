//! Shared mutable traversal state and its stop/partial bookkeeping.
//!
//! One coarse mutex guards everything here; workers hold it only for
//! metadata updates, never across directory-listing syscalls. A single
//! condition variable wakes workers on frontier pushes, stop requests, and
//! completion.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::PathBuf;

use parking_lot::{Condvar, Mutex};

use crate::core::config::ScanLimits;
use crate::scanner::aggregate::AggregateTable;
use crate::scanner::duplicates::DuplicateAccumulator;
use crate::scanner::rank::TopList;
use crate::scanner::report::{
    CleanupCandidateReport, FileReportEntry, OLD_DOWNLOADS_CAP, ScanErrorEntry,
    UNROTATED_LOGS_CAP,
};

/// Most entries retained in the error list; the permission-denied counter
/// keeps counting past it.
pub const ERROR_LIST_CAP: usize = 200;

/// One unit of traversal work: a directory awaiting listing.
#[derive(Debug, Clone)]
pub struct ScanFrame {
    /// Directory to list.
    pub path: PathBuf,
    /// Depth below the seed frame that discovered it.
    pub depth: u32,
}

/// Everything the workers share, guarded by [`SharedScan::state`].
#[derive(Debug)]
pub struct ScanState {
    /// LIFO frontier; popping the most recent frame keeps traversal
    /// depth-first, bounding frontier growth.
    pub frontier: Vec<ScanFrame>,
    /// Directories ever enqueued; insertion here is the single point that
    /// guarantees each directory is queued at most once.
    pub visited: HashSet<String>,
    /// Per-directory rollup state.
    pub aggregates: AggregateTable,
    /// Largest files seen so far.
    pub top_files: TopList<FileReportEntry>,
    /// Stale downloads, bounded to the reporting cap.
    pub old_downloads: TopList<FileReportEntry>,
    /// Oversized logs, bounded to the reporting cap.
    pub unrotated_logs: TopList<FileReportEntry>,
    /// Duplicate-name groups.
    pub duplicates: DuplicateAccumulator,
    /// Cleanup candidates keyed by path; largest size wins per key.
    pub cleanup: HashMap<String, CleanupCandidateReport>,
    /// Per-category `(bytes, files)` totals.
    pub temp_totals: HashMap<&'static str, (u64, u64)>,
    /// Bounded failure list.
    pub errors: Vec<ScanErrorEntry>,
    /// Uncapped permission-denied counter.
    pub permission_denied_count: u64,
    /// Global entries-seen counter checked against the entry ceiling.
    pub entries_seen: u64,
    /// Files examined.
    pub files_scanned: u64,
    /// Bytes attributed to examined files.
    pub bytes_scanned: u64,
    /// Deepest frame listed so far.
    pub max_depth_reached: u32,
    /// Workers currently processing a frame.
    pub active_workers: usize,
    /// A stop was requested; workers exit instead of popping new frames.
    pub stopping: bool,
    /// Frontier drained with no active worker.
    pub done: bool,
    /// Whether the report under-counts.
    pub partial: bool,
    /// First stop reason, with the depth-limit reason demoted to a fallback.
    pub reason: Option<String>,
    reason_is_fallback: bool,
}

impl ScanState {
    /// Fresh state sized to the run's limits.
    #[must_use]
    pub fn new(limits: &ScanLimits) -> Self {
        Self {
            frontier: Vec::new(),
            visited: HashSet::new(),
            aggregates: AggregateTable::default(),
            top_files: TopList::new(limits.top_files),
            old_downloads: TopList::new(OLD_DOWNLOADS_CAP),
            unrotated_logs: TopList::new(UNROTATED_LOGS_CAP),
            duplicates: DuplicateAccumulator::default(),
            cleanup: HashMap::new(),
            temp_totals: HashMap::new(),
            errors: Vec::new(),
            permission_denied_count: 0,
            entries_seen: 0,
            files_scanned: 0,
            bytes_scanned: 0,
            max_depth_reached: 0,
            active_workers: 0,
            stopping: false,
            done: false,
            partial: false,
            reason: None,
            reason_is_fallback: false,
        }
    }

    /// Note that the depth limit clipped a subtree. Sets `partial` and a
    /// fallback reason that any explicit stop reason may overwrite.
    pub fn note_depth_limit(&mut self) {
        self.partial = true;
        if self.reason.is_none() {
            self.reason = Some("max depth reached".to_string());
            self.reason_is_fallback = true;
        }
    }

    /// Request a global stop. First explicit reason wins; the depth-limit
    /// fallback is always overwritten.
    pub fn request_stop(&mut self, reason: &str) {
        self.stopping = true;
        self.partial = true;
        if self.reason.is_none() || self.reason_is_fallback {
            self.reason = Some(reason.to_string());
            self.reason_is_fallback = false;
        }
    }

    /// Record a traversal failure, counting permission denials separately.
    pub fn record_error(&mut self, path: &str, error: &io::Error) {
        if error.kind() == io::ErrorKind::PermissionDenied {
            self.permission_denied_count += 1;
        }
        if self.errors.len() < ERROR_LIST_CAP {
            self.errors.push(ScanErrorEntry {
                path: path.to_string(),
                error: error.to_string(),
            });
        }
    }

    /// Record a cleanup candidate, keeping the largest size per path.
    pub fn record_cleanup_candidate(&mut self, path: String, size_bytes: u64, category: &str) {
        self.cleanup
            .entry(path.clone())
            .and_modify(|existing| {
                if size_bytes > existing.size_bytes {
                    existing.size_bytes = size_bytes;
                    existing.category = category.to_string();
                }
            })
            .or_insert_with(|| CleanupCandidateReport {
                path,
                size_bytes,
                category: category.to_string(),
            });
    }
}

/// The lock/condvar pair every worker shares.
#[derive(Debug)]
pub struct SharedScan {
    /// Coarse lock over all traversal state.
    pub state: Mutex<ScanState>,
    /// Woken on frontier pushes, stop requests, and completion.
    pub wake: Condvar,
}

impl SharedScan {
    /// Wrap fresh state for a run.
    #[must_use]
    pub fn new(state: ScanState) -> Self {
        Self {
            state: Mutex::new(state),
            wake: Condvar::new(),
        }
    }
}
