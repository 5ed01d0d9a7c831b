//! Scan response structures and final report assembly.
//!
//! Field names follow the dispatcher's wire convention (camelCase JSON);
//! timestamps are RFC 3339 UTC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::config::ScanMode;
use crate::scanner::checkpoint::Checkpoint;
use crate::scanner::rank::SizeRanked;

/// List caps applied at assembly time.
pub const OLD_DOWNLOADS_CAP: usize = 200;
/// Cap for the unrotated-logs list.
pub const UNROTATED_LOGS_CAP: usize = 200;
/// Cap for reported duplicate groups.
pub const DUPLICATE_GROUPS_CAP: usize = 200;
/// Cap for reported cleanup candidates.
pub const CLEANUP_CANDIDATES_CAP: usize = 1000;

/// One file in a ranked list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReportEntry {
    /// File path.
    pub path: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Last modification time, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

/// One directory in the largest-directories list, with subtree totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirReportEntry {
    /// Directory path.
    pub path: String,
    /// Subtree bytes.
    pub size_bytes: u64,
    /// Subtree file count.
    pub file_count: u64,
    /// Whether the totals are a known lower bound.
    pub incomplete: bool,
}

/// Byte total for one cleanup category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempCategoryUsage {
    /// Category name, e.g. `temp_files`.
    pub category: String,
    /// Total bytes classified into the category.
    pub bytes: u64,
    /// Number of files classified into the category.
    pub file_count: u64,
}

/// Estimated usage of one trash/recycle-bin location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashUsage {
    /// Trash location path.
    pub path: String,
    /// Bytes counted under the location.
    pub size_bytes: u64,
    /// Files counted under the location.
    pub file_count: u64,
    /// Whether the walk was cut short by budget or deadline.
    pub truncated: bool,
}

/// A group of same-size, same-normalized-name files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroupReport {
    /// Normalized basename shared by the group.
    pub base_name: String,
    /// Size every member shares.
    pub size_bytes: u64,
    /// Total members seen (may exceed the retained paths).
    pub count: u64,
    /// Member paths, capped.
    pub paths: Vec<String>,
}

/// One path proposed as safe to delete. Nothing is ever removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupCandidateReport {
    /// Candidate path.
    pub path: String,
    /// Size attributed to the candidate.
    pub size_bytes: u64,
    /// Category that qualified it.
    pub category: String,
}

/// One recorded traversal failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanErrorEntry {
    /// Path the failure occurred at.
    pub path: String,
    /// Failure description.
    pub error: String,
}

/// Headline counters for the whole scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    /// Files examined.
    pub files_scanned: u64,
    /// Directories discovered (including seed roots).
    pub dirs_scanned: u64,
    /// Bytes attributed to examined files.
    pub bytes_scanned: u64,
    /// Deepest frame actually listed.
    pub max_depth_reached: u32,
    /// Permission-denied failures, uncapped.
    pub permission_denied_count: u64,
}

/// Complete response for one scan invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// Scan root as requested.
    pub path: String,
    /// Scan mode the invocation ran in.
    pub scan_mode: ScanMode,
    /// Wall-clock start, RFC 3339 UTC.
    pub started_at: DateTime<Utc>,
    /// Wall-clock completion, RFC 3339 UTC.
    pub completed_at: DateTime<Utc>,
    /// Elapsed milliseconds, monotonic.
    pub duration_ms: u64,
    /// Whether this report under-counts.
    pub partial: bool,
    /// Why the scan stopped early, when it did.
    pub reason: Option<String>,
    /// Resume payload, present only when work remains.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<Checkpoint>,
    /// Headline counters.
    pub summary: ScanSummary,
    /// Largest files, descending.
    pub top_largest_files: Vec<FileReportEntry>,
    /// Largest directories by subtree size, descending.
    pub top_largest_dirs: Vec<DirReportEntry>,
    /// Per-category temp/cache byte breakdown, descending.
    pub temp_accumulation: Vec<TempCategoryUsage>,
    /// Stale downloads, by size descending.
    pub old_downloads: Vec<FileReportEntry>,
    /// Oversized never-rotated logs, by size descending.
    pub unrotated_logs: Vec<FileReportEntry>,
    /// Trash locations by estimated size, descending.
    pub trash_usage: Vec<TrashUsage>,
    /// Duplicate-name candidate groups.
    pub duplicate_candidates: Vec<DuplicateGroupReport>,
    /// Safe-to-delete proposals, by size descending.
    pub cleanup_candidates: Vec<CleanupCandidateReport>,
    /// Bounded failure list.
    pub errors: Vec<ScanErrorEntry>,
}

impl SizeRanked for FileReportEntry {
    fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

impl SizeRanked for DirReportEntry {
    fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

/// Sort cleanup candidates by size descending and cap the list.
pub(crate) fn finish_cleanup_candidates(
    mut candidates: Vec<CleanupCandidateReport>,
) -> Vec<CleanupCandidateReport> {
    candidates.sort_by(|a, b| {
        b.size_bytes
            .cmp(&a.size_bytes)
            .then_with(|| a.path.cmp(&b.path))
    });
    candidates.truncate(CLEANUP_CANDIDATES_CAP);
    candidates
}

/// Sort the per-category breakdown by bytes descending.
pub(crate) fn finish_temp_accumulation(
    mut categories: Vec<TempCategoryUsage>,
) -> Vec<TempCategoryUsage> {
    categories.sort_by(|a, b| {
        b.bytes
            .cmp(&a.bytes)
            .then_with(|| a.category.cmp(&b.category))
    });
    categories
}

/// Sort trash usage by size descending.
pub(crate) fn finish_trash_usage(mut usage: Vec<TrashUsage>) -> Vec<TrashUsage> {
    usage.sort_by(|a, b| {
        b.size_bytes
            .cmp(&a.size_bytes)
            .then_with(|| a.path.cmp(&b.path))
    });
    usage
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_with_wire_field_names() {
        let report = ScanReport {
            path: "/data".to_string(),
            scan_mode: ScanMode::Baseline,
            started_at: Utc::now(),
            completed_at: Utc::now(),
            duration_ms: 12,
            partial: false,
            reason: None,
            checkpoint: None,
            summary: ScanSummary::default(),
            top_largest_files: vec![FileReportEntry {
                path: "/data/a".to_string(),
                size_bytes: 1,
                modified: None,
            }],
            top_largest_dirs: Vec::new(),
            temp_accumulation: Vec::new(),
            old_downloads: Vec::new(),
            unrotated_logs: Vec::new(),
            trash_usage: Vec::new(),
            duplicate_candidates: Vec::new(),
            cleanup_candidates: Vec::new(),
            errors: Vec::new(),
        };

        let json = serde_json::to_string(&report).expect("serialize");
        for key in [
            "\"scanMode\":\"baseline\"",
            "\"startedAt\"",
            "\"durationMs\"",
            "\"filesScanned\"",
            "\"maxDepthReached\"",
            "\"permissionDeniedCount\"",
            "\"topLargestFiles\"",
            "\"sizeBytes\"",
            "\"tempAccumulation\"",
            "\"oldDownloads\"",
            "\"unrotatedLogs\"",
            "\"trashUsage\"",
            "\"duplicateCandidates\"",
            "\"cleanupCandidates\"",
        ] {
            assert!(json.contains(key), "missing {key} in {json}");
        }
        // Absent checkpoint is omitted entirely.
        assert!(!json.contains("\"checkpoint\""));
    }

    #[test]
    fn finishers_sort_descending_and_cap() {
        let candidates = (0..(CLEANUP_CANDIDATES_CAP + 5))
            .map(|index| CleanupCandidateReport {
                path: format!("/c/{index}"),
                size_bytes: index as u64,
                category: "temp_files".to_string(),
            })
            .collect();
        let finished = finish_cleanup_candidates(candidates);
        assert_eq!(finished.len(), CLEANUP_CANDIDATES_CAP);
        assert_eq!(finished[0].size_bytes, (CLEANUP_CANDIDATES_CAP + 4) as u64);

        let trash = finish_trash_usage(vec![
            TrashUsage {
                path: "/t/small".to_string(),
                size_bytes: 1,
                file_count: 1,
                truncated: false,
            },
            TrashUsage {
                path: "/t/big".to_string(),
                size_bytes: 10,
                file_count: 2,
                truncated: false,
            },
        ]);
        assert_eq!(trash[0].path, "/t/big");
    }
}
