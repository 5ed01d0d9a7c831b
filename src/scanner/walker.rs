//! Traversal orchestrator and worker pool.
//!
//! A fixed pool of OS threads shares one mutex-protected frontier and one
//! condition variable. Workers pop the most recently pushed frame (depth
//! first, which bounds frontier growth and surfaces deep hot spots early),
//! list it outside the lock, then merge metadata updates under the lock.
//! A single wall-clock deadline and a global entry ceiling bound the run;
//! whatever the frontier still holds at stop time becomes the checkpoint.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::core::config::{ScanLimits, ScanMode, ScanRequest};
use crate::core::errors::{DsaError, Result};
use crate::core::paths::{path_key, resolve_absolute_path};
use crate::logger::{LogEvent, LogLevel, NullLogger, ScanLogger};
use crate::platform;
use crate::scanner::checkpoint::{Checkpoint, PendingDir};
use crate::scanner::classify::{
    CATEGORY_TRASH, cleanup_category, is_old_download, is_unrotated_log,
};
use crate::scanner::rank::TopList;
use crate::scanner::report::{
    DUPLICATE_GROUPS_CAP, DirReportEntry, FileReportEntry, ScanReport, ScanSummary,
    TempCategoryUsage, TrashUsage, finish_cleanup_candidates, finish_temp_accumulation,
    finish_trash_usage,
};
use crate::scanner::source::{EntryKind, EntrySource, OsEntrySource};
use crate::scanner::state::{ScanFrame, ScanState, SharedScan};
use crate::scanner::trash::estimate_trash;

/// The filesystem-analysis engine: owns its collaborators, runs scans.
pub struct ScanEngine {
    source: Arc<dyn EntrySource>,
    trash_paths: Vec<PathBuf>,
    logger: Arc<dyn ScanLogger>,
}

impl Default for ScanEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanEngine {
    /// Engine wired to the real filesystem and platform trash locations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: Arc::new(OsEntrySource),
            trash_paths: platform::default_trash_paths(),
            logger: Arc::new(NullLogger),
        }
    }

    /// Substitute the directory-entry lister.
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn EntrySource>) -> Self {
        self.source = source;
        self
    }

    /// Override the trash-location candidates.
    #[must_use]
    pub fn with_trash_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.trash_paths = paths;
        self
    }

    /// Attach a scan-event sink.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn ScanLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Run one scan invocation to completion, stop, or failure.
    ///
    /// The only fatal failure is the root precondition; every other problem
    /// degrades to a partial result carried inside the report.
    pub fn run(&self, request: &ScanRequest) -> Result<ScanReport> {
        let limits = request.limits()?;
        let started_at = Utc::now();
        let clock = Instant::now();
        let scan_wall = SystemTime::now();
        let deadline = clock + limits.timeout;

        let root = resolve_absolute_path(&request.path);
        match self.source.stat_follow(&root) {
            Ok(info) if info.kind == EntryKind::Directory => {}
            Ok(_) => return Err(DsaError::ScanRootNotDirectory { path: root }),
            Err(_) => return Err(DsaError::ScanRootMissing { path: root }),
        }

        let mut state = ScanState::new(&limits);
        seed_frontier(&mut state, &root, request, self.source.as_ref());

        self.logger.record(
            LogEvent::new(LogLevel::Info, "scanner", "scan started").with_fields(json!({
                "path": path_key(&root),
                "mode": request.scan_mode.as_str(),
                "workers": limits.workers,
                "maxEntries": limits.max_entries,
                "timeoutSeconds": limits.timeout.as_secs(),
                "seededFrames": state.frontier.len(),
            })),
        );

        let shared = SharedScan::new(state);
        std::thread::scope(|scope| {
            for _ in 0..limits.workers {
                scope.spawn(|| worker_loop(&shared, self.source.as_ref(), &limits, deadline, scan_wall));
            }
        });

        let mut state = shared.state.into_inner();

        // Frames the stop left behind are a lower bound on their subtrees
        // and the seed of the next invocation.
        let leftover = std::mem::take(&mut state.frontier);
        let mut pending = Vec::with_capacity(leftover.len());
        for frame in leftover {
            let key = path_key(&frame.path);
            state.aggregates.mark_incomplete_chain(&key);
            pending.push(PendingDir {
                path: key,
                depth: frame.depth,
            });
        }
        let checkpoint = Checkpoint::from_pending(pending);

        state.aggregates.rollup();

        if state.partial {
            self.logger.record(
                LogEvent::new(LogLevel::Warn, "scanner", "scan stopped early").with_fields(
                    json!({
                        "reason": state.reason.clone(),
                        "pendingDirs": checkpoint.as_ref().map_or(0, |cp| cp.pending_dirs.len()),
                    }),
                ),
            );
        }

        let trash_usage = self.estimate_trash_locations(&mut state, deadline, &limits);
        if !trash_usage.is_empty() {
            self.logger.record(
                LogEvent::new(LogLevel::Info, "scanner", "trash estimation finished").with_fields(
                    json!({
                        "locations": trash_usage.len(),
                        "bytes": trash_usage.iter().map(|usage| usage.size_bytes).sum::<u64>(),
                    }),
                ),
            );
        }
        let report = assemble_report(
            state,
            ReportMeta {
                root_key: path_key(&root),
                scan_mode: request.scan_mode,
                started_at,
                duration_ms: u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX),
                checkpoint,
                trash_usage,
                top_dirs_limit: limits.top_dirs,
            },
        );

        self.logger.record(
            LogEvent::new(LogLevel::Info, "scanner", "scan completed").with_fields(json!({
                "durationMs": report.duration_ms,
                "filesScanned": report.summary.files_scanned,
                "dirsScanned": report.summary.dirs_scanned,
                "bytesScanned": report.summary.bytes_scanned,
                "partial": report.partial,
            })),
        );

        Ok(report)
    }

    /// Estimate every known trash location after the main traversal; runs
    /// against the same overall deadline.
    fn estimate_trash_locations(
        &self,
        state: &mut ScanState,
        deadline: Instant,
        limits: &ScanLimits,
    ) -> Vec<TrashUsage> {
        let mut usage = Vec::new();
        for trash_path in &self.trash_paths {
            let estimate = estimate_trash(
                self.source.as_ref(),
                trash_path,
                deadline,
                limits.trash_entry_budget(),
            );
            for (path, err) in &estimate.errors {
                state.record_error(&path_key(path), err);
            }
            if !estimate.exists {
                continue;
            }
            let key = path_key(trash_path);
            if estimate.size_bytes > 0 {
                state.record_cleanup_candidate(key.clone(), estimate.size_bytes, CATEGORY_TRASH);
            }
            usage.push(TrashUsage {
                path: key,
                size_bytes: estimate.size_bytes,
                file_count: estimate.file_count,
                truncated: estimate.truncated,
            });
        }
        usage
    }
}

/// Seed precedence: checkpoint, then incremental targets, then the root.
fn seed_frontier(
    state: &mut ScanState,
    root: &std::path::Path,
    request: &ScanRequest,
    source: &dyn EntrySource,
) {
    if let Some(checkpoint) = request.checkpoint.as_ref().filter(|cp| !cp.is_empty()) {
        for pending in &checkpoint.pending_dirs {
            if state.visited.insert(pending.path.clone()) {
                state.aggregates.ensure(&pending.path, "", pending.depth);
                state.frontier.push(ScanFrame {
                    path: PathBuf::from(&pending.path),
                    depth: pending.depth,
                });
            }
        }
        return;
    }

    if request.scan_mode == ScanMode::Incremental && !request.target_directories.is_empty() {
        for target in &request.target_directories {
            let target = resolve_absolute_path(target);
            let is_dir = source
                .stat_follow(&target)
                .is_ok_and(|info| info.kind == EntryKind::Directory);
            if !is_dir {
                // Vanished targets are expected between incremental passes.
                continue;
            }
            let key = path_key(&target);
            if state.visited.insert(key.clone()) {
                state.aggregates.ensure(&key, "", 0);
                state.frontier.push(ScanFrame {
                    path: target,
                    depth: 0,
                });
            }
        }
        return;
    }

    let key = path_key(root);
    state.visited.insert(key.clone());
    state.aggregates.ensure(&key, "", 0);
    state.frontier.push(ScanFrame {
        path: root.to_path_buf(),
        depth: 0,
    });
}

fn worker_loop(
    shared: &SharedScan,
    source: &dyn EntrySource,
    limits: &ScanLimits,
    deadline: Instant,
    scan_wall: SystemTime,
) {
    loop {
        let frame = {
            let mut st = shared.state.lock();
            loop {
                if st.stopping || st.done {
                    return;
                }
                if let Some(frame) = st.frontier.pop() {
                    st.active_workers += 1;
                    break frame;
                }
                if st.active_workers == 0 {
                    st.done = true;
                    shared.wake.notify_all();
                    return;
                }
                shared.wake.wait(&mut st);
            }
        };

        process_frame(shared, source, limits, deadline, scan_wall, frame);

        let mut st = shared.state.lock();
        st.active_workers -= 1;
        if st.frontier.is_empty() && st.active_workers == 0 && !st.stopping {
            st.done = true;
        }
        drop(st);
        shared.wake.notify_all();
    }
}

/// Per-entry result of the worker-local (unlocked) classification pass.
enum Classified {
    Dir {
        path: PathBuf,
    },
    File {
        path: PathBuf,
        key: String,
        size_bytes: u64,
        modified: Option<SystemTime>,
        category: &'static str,
        old_download: bool,
        unrotated_log: bool,
    },
    Other,
}

fn process_frame(
    shared: &SharedScan,
    source: &dyn EntrySource,
    limits: &ScanLimits,
    deadline: Instant,
    scan_wall: SystemTime,
    frame: ScanFrame,
) {
    // One deadline check per directory keeps the cost amortized; putting the
    // frame back guarantees the in-flight directory is never silently lost.
    if Instant::now() >= deadline {
        let mut st = shared.state.lock();
        st.frontier.push(frame);
        st.request_stop("timeout reached");
        drop(st);
        shared.wake.notify_all();
        return;
    }

    let frame_key = path_key(&frame.path);
    let listing = match source.list_dir(&frame.path) {
        Ok(listing) => listing,
        Err(err) => {
            // The subtree is unknowable from here; its children are never
            // discovered.
            let mut st = shared.state.lock();
            st.aggregates.mark_incomplete_chain(&frame_key);
            st.record_error(&frame_key, &err);
            return;
        }
    };

    // Worker-local pass: resolve symlinks and classify without the lock.
    let mut stat_errors: Vec<(String, std::io::Error)> = listing
        .entry_errors
        .into_iter()
        .map(|(path, err)| (path_key(&path), err))
        .collect();
    let mut classified = Vec::with_capacity(listing.entries.len());
    for entry in listing.entries {
        let child = frame.path.join(&entry.name);
        let is_link = entry.is_symlink;
        let info = if is_link {
            if !limits.follow_symlinks {
                continue;
            }
            match source.stat_follow(&child) {
                Ok(info) => info,
                Err(err) => {
                    stat_errors.push((path_key(&child), err));
                    continue;
                }
            }
        } else {
            entry
        };
        match info.kind {
            EntryKind::Directory => {
                // Queue a followed link's canonical target so a subtree
                // reachable through several links is counted exactly once.
                let path = if is_link {
                    source.canonical(&child).unwrap_or(child)
                } else {
                    child
                };
                classified.push(Classified::Dir { path });
            }
            EntryKind::File => classified.push(Classified::File {
                key: path_key(&child),
                size_bytes: info.size_bytes,
                modified: info.modified,
                category: cleanup_category(&child),
                old_download: is_old_download(&child, info.size_bytes, info.modified, scan_wall),
                unrotated_log: is_unrotated_log(&child, info.size_bytes),
                path: child,
            }),
            EntryKind::Other => classified.push(Classified::Other),
        }
    }

    // Merge pass: one lock acquisition for the whole directory, entry
    // ceiling checked per entry so the overshoot is at most this
    // directory's tail.
    let mut pushed = false;
    let mut st = shared.state.lock();
    st.max_depth_reached = st.max_depth_reached.max(frame.depth);
    for (path, err) in stat_errors {
        st.record_error(&path, &err);
    }
    for item in classified {
        st.entries_seen += 1;
        if st.entries_seen > limits.max_entries {
            st.aggregates.mark_incomplete_chain(&frame_key);
            st.request_stop("max entries reached");
            break;
        }
        match item {
            Classified::Dir { path } => {
                let key = path_key(&path);
                let child_depth = frame.depth + 1;
                st.aggregates.ensure(&key, &frame_key, child_depth);
                if child_depth > limits.max_depth {
                    st.aggregates.mark_incomplete_chain(&key);
                    st.note_depth_limit();
                } else if st.visited.insert(key) {
                    st.frontier.push(ScanFrame {
                        path,
                        depth: child_depth,
                    });
                    pushed = true;
                }
            }
            Classified::File {
                path,
                key,
                size_bytes,
                modified,
                category,
                old_download,
                unrotated_log,
            } => {
                st.aggregates.add_file(&frame_key, size_bytes);
                st.files_scanned += 1;
                st.bytes_scanned += size_bytes;
                let entry = FileReportEntry {
                    path: key.clone(),
                    size_bytes,
                    modified: modified.map(DateTime::<Utc>::from),
                };
                if !category.is_empty() {
                    let slot = st.temp_totals.entry(category).or_insert((0, 0));
                    slot.0 += size_bytes;
                    slot.1 += 1;
                    st.record_cleanup_candidate(key, size_bytes, category);
                }
                if old_download {
                    st.old_downloads.offer(entry.clone());
                }
                if unrotated_log {
                    st.unrotated_logs.offer(entry.clone());
                }
                st.duplicates.offer(&path, size_bytes);
                st.top_files.offer(entry);
            }
            Classified::Other => {}
        }
    }
    let stop_requested = st.stopping;
    drop(st);
    if pushed || stop_requested {
        shared.wake.notify_all();
    }
}

/// Everything the assembler needs besides the traversal state itself.
struct ReportMeta {
    root_key: String,
    scan_mode: ScanMode,
    started_at: DateTime<Utc>,
    duration_ms: u64,
    checkpoint: Option<Checkpoint>,
    trash_usage: Vec<TrashUsage>,
    top_dirs_limit: usize,
}

/// Merge traversal state, rollup results, and trash estimates into the
/// final response.
fn assemble_report(state: ScanState, meta: ReportMeta) -> ScanReport {
    // Directory ranking happens here, after rollup, when subtree totals
    // are final.
    let mut top_dirs = TopList::new(meta.top_dirs_limit);
    for aggregate in state.aggregates.iter() {
        top_dirs.offer(DirReportEntry {
            path: aggregate.path.clone(),
            size_bytes: aggregate.size_bytes,
            file_count: aggregate.file_count,
            incomplete: aggregate.incomplete,
        });
    }

    let temp_accumulation = finish_temp_accumulation(
        state
            .temp_totals
            .into_iter()
            .map(|(category, (bytes, file_count))| TempCategoryUsage {
                category: category.to_string(),
                bytes,
                file_count,
            })
            .collect(),
    );

    ScanReport {
        path: meta.root_key,
        scan_mode: meta.scan_mode,
        started_at: meta.started_at,
        completed_at: Utc::now(),
        duration_ms: meta.duration_ms,
        partial: state.partial,
        reason: state.reason,
        checkpoint: meta.checkpoint,
        summary: ScanSummary {
            files_scanned: state.files_scanned,
            dirs_scanned: state.aggregates.len() as u64,
            bytes_scanned: state.bytes_scanned,
            max_depth_reached: state.max_depth_reached,
            permission_denied_count: state.permission_denied_count,
        },
        top_largest_files: state.top_files.into_vec(),
        top_largest_dirs: top_dirs.into_vec(),
        temp_accumulation,
        old_downloads: state.old_downloads.into_vec(),
        unrotated_logs: state.unrotated_logs.into_vec(),
        trash_usage: finish_trash_usage(meta.trash_usage),
        duplicate_candidates: state.duplicates.into_reportable(DUPLICATE_GROUPS_CAP),
        cleanup_candidates: finish_cleanup_candidates(state.cleanup.into_values().collect()),
        errors: state.errors,
    }
}
