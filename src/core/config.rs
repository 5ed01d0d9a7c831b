//! Scan request parameters, effective-limit resolution, and agent defaults.
//!
//! The dispatcher that fronts this engine sends a [`ScanRequest`]; the engine
//! resolves it into a [`ScanLimits`] with every field defaulted and clamped.
//! Resolution is pure: the same request always yields the same limits, so a
//! resumed scan runs under the budget its caller asked for.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{DsaError, Result};
use crate::scanner::checkpoint::Checkpoint;

/// Hard ceiling on traversal depth, both modes.
pub const MAX_DEPTH_CEILING: u32 = 64;
/// Default depth for a baseline (first, full) scan.
pub const DEFAULT_DEPTH_BASELINE: u32 = 32;
/// Default depth for an incremental (targeted re-scan) pass.
pub const DEFAULT_DEPTH_INCREMENTAL: u32 = 12;
/// Default size of the largest-files list.
pub const DEFAULT_TOP_FILES: usize = 50;
/// Ceiling on the largest-files list.
pub const MAX_TOP_FILES: usize = 500;
/// Default size of the largest-directories list.
pub const DEFAULT_TOP_DIRS: usize = 30;
/// Ceiling on the largest-directories list.
pub const MAX_TOP_DIRS: usize = 200;
/// Default entry-count ceiling for one invocation.
pub const DEFAULT_MAX_ENTRIES: u64 = 2_000_000;
/// Hard ceiling on the entry count.
pub const MAX_MAX_ENTRIES: u64 = 5_000_000;
/// Default wall-clock budget in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 20;
/// Smallest accepted wall-clock budget.
pub const MIN_TIMEOUT_SECONDS: u64 = 5;
/// Largest accepted wall-clock budget.
pub const MAX_TIMEOUT_SECONDS: u64 = 900;
/// Hard ceiling on the worker pool.
pub const MAX_WORKERS: usize = 32;
const BASELINE_WORKER_CAP: usize = 16;
const INCREMENTAL_WORKER_CAP: usize = 4;

/// Which traversal posture a scan runs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Full-depth first scan of a root.
    #[default]
    Baseline,
    /// Shallow re-scan focused on explicit target directories.
    Incremental,
}

impl ScanMode {
    /// Lowercase wire name, as serialized in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Incremental => "incremental",
        }
    }
}

/// One scan invocation as decoded by the dispatcher.
///
/// Optional fields fall back to mode-dependent defaults during resolution;
/// out-of-range values are clamped rather than rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanRequest {
    /// Root directory to scan. Required.
    pub path: PathBuf,
    /// Baseline or incremental posture.
    pub scan_mode: ScanMode,
    /// Maximum traversal depth below the seed frames.
    pub max_depth: Option<u32>,
    /// Capacity of the largest-files list.
    pub top_files: Option<usize>,
    /// Capacity of the largest-directories list.
    pub top_dirs: Option<usize>,
    /// Global ceiling on entries examined in this invocation.
    pub max_entries: Option<u64>,
    /// Wall-clock budget for the whole invocation.
    pub timeout_seconds: Option<u64>,
    /// Resolve and descend into symlinked directories.
    pub follow_symlinks: bool,
    /// Worker-pool size override.
    pub workers: Option<usize>,
    /// Resume payload from a previous partial scan.
    pub checkpoint: Option<Checkpoint>,
    /// Incremental mode only: explicit directories to re-scan.
    pub target_directories: Vec<PathBuf>,
}

impl ScanRequest {
    /// A request for `path` with every other field defaulted.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Resolve defaults and clamps into the effective limits for this run.
    pub fn limits(&self) -> Result<ScanLimits> {
        if self.path.as_os_str().is_empty() {
            return Err(DsaError::InvalidRequest {
                details: "path must not be empty".to_string(),
            });
        }

        let default_depth = match self.scan_mode {
            ScanMode::Baseline => DEFAULT_DEPTH_BASELINE,
            ScanMode::Incremental => DEFAULT_DEPTH_INCREMENTAL,
        };

        Ok(ScanLimits {
            max_depth: self.max_depth.unwrap_or(default_depth).min(MAX_DEPTH_CEILING),
            top_files: self
                .top_files
                .unwrap_or(DEFAULT_TOP_FILES)
                .min(MAX_TOP_FILES),
            top_dirs: self.top_dirs.unwrap_or(DEFAULT_TOP_DIRS).min(MAX_TOP_DIRS),
            max_entries: self
                .max_entries
                .unwrap_or(DEFAULT_MAX_ENTRIES)
                .min(MAX_MAX_ENTRIES)
                .max(1),
            timeout: Duration::from_secs(
                self.timeout_seconds
                    .unwrap_or(DEFAULT_TIMEOUT_SECONDS)
                    .clamp(MIN_TIMEOUT_SECONDS, MAX_TIMEOUT_SECONDS),
            ),
            follow_symlinks: self.follow_symlinks,
            workers: resolve_workers(self.workers, self.scan_mode),
        })
    }
}

/// Fully defaulted, clamped limits for one scan run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct ScanLimits {
    pub max_depth: u32,
    pub top_files: usize,
    pub top_dirs: usize,
    pub max_entries: u64,
    pub timeout: Duration,
    pub follow_symlinks: bool,
    pub workers: usize,
}

impl ScanLimits {
    /// Entry budget for each trash-location estimation walk.
    #[must_use]
    pub const fn trash_entry_budget(&self) -> u64 {
        self.max_entries / 2
    }
}

fn resolve_workers(requested: Option<usize>, mode: ScanMode) -> usize {
    let derived = requested.unwrap_or_else(|| {
        let cpus = std::thread::available_parallelism().map_or(4, usize::from);
        // Incremental scans favor fewer, longer-running workers.
        match mode {
            ScanMode::Baseline => cpus.min(BASELINE_WORKER_CAP),
            ScanMode::Incremental => (cpus / 2).min(INCREMENTAL_WORKER_CAP),
        }
    });
    derived.clamp(1, MAX_WORKERS)
}

// ---------------------------------------------------------------------------
// Agent-level defaults (CLI only)
// ---------------------------------------------------------------------------

/// Optional TOML defaults applied by the CLI before a request is resolved.
///
/// The library API never reads files; this exists so a fleet operator can pin
/// endpoint-wide budgets without re-specifying them per invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Default entry ceiling for scans on this endpoint.
    pub max_entries: Option<u64>,
    /// Default wall-clock budget in seconds.
    pub timeout_seconds: Option<u64>,
    /// Default worker-pool size.
    pub workers: Option<usize>,
    /// JSONL scan-event log destination.
    pub log_file: Option<PathBuf>,
    /// Override the platform trash-location candidates.
    pub trash_paths: Vec<PathBuf>,
}

impl AgentConfig {
    /// Load defaults from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                DsaError::MissingConfig {
                    path: path.to_path_buf(),
                }
            } else {
                DsaError::io(path, err)
            }
        })?;
        Ok(toml::from_str(&raw)?)
    }

    /// Fill unset request fields from these defaults.
    pub fn apply(&self, request: &mut ScanRequest) {
        if request.max_entries.is_none() {
            request.max_entries = self.max_entries;
        }
        if request.timeout_seconds.is_none() {
            request.timeout_seconds = self.timeout_seconds;
        }
        if request.workers.is_none() {
            request.workers = self.workers;
        }
    }
}
