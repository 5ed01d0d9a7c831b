//! Bounded estimation of trash/recycle-bin usage.
//!
//! Runs once after the main traversal, against the same overall deadline.
//! Single-threaded, no symlink following; a missing location is not an
//! error, it is simply skipped.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::scanner::source::{EntryKind, EntrySource};

/// Outcome of estimating one trash location.
#[derive(Debug, Default)]
pub struct TrashEstimate {
    /// Whether the location exists as a directory.
    pub exists: bool,
    /// Bytes counted.
    pub size_bytes: u64,
    /// Files counted.
    pub file_count: u64,
    /// Whether the walk stopped on the deadline or entry budget.
    pub truncated: bool,
    /// Listing failures encountered along the way.
    pub errors: Vec<(PathBuf, io::Error)>,
}

/// Walk one trash location depth-first, counting bytes and files until the
/// entry budget or deadline cuts it short.
pub fn estimate_trash(
    source: &dyn EntrySource,
    root: &Path,
    deadline: Instant,
    entry_budget: u64,
) -> TrashEstimate {
    let mut estimate = TrashEstimate::default();

    match source.stat_follow(root) {
        Ok(info) if info.kind == EntryKind::Directory => {}
        Ok(_) => return estimate,
        Err(err) => {
            if err.kind() != io::ErrorKind::NotFound {
                estimate.errors.push((root.to_path_buf(), err));
            }
            return estimate;
        }
    }
    estimate.exists = true;

    let mut entries_seen = 0u64;
    let mut stack = vec![root.to_path_buf()];

    while let Some(directory) = stack.pop() {
        if Instant::now() >= deadline {
            estimate.truncated = true;
            break;
        }
        let listing = match source.list_dir(&directory) {
            Ok(listing) => listing,
            Err(err) => {
                estimate.errors.push((directory, err));
                continue;
            }
        };
        for entry in listing.entries {
            entries_seen += 1;
            if entries_seen > entry_budget {
                estimate.truncated = true;
                return estimate;
            }
            match entry.kind {
                EntryKind::File => {
                    estimate.size_bytes += entry.size_bytes;
                    estimate.file_count += 1;
                }
                EntryKind::Directory => stack.push(directory.join(&entry.name)),
                // Symlinks and specials are never followed here.
                EntryKind::Other => {}
            }
        }
    }

    estimate
}
