//! Shared fixtures for the integration suites.

#![allow(dead_code)] // not every suite uses every helper

use std::fs::File;
use std::path::{Path, PathBuf};

use disk_survey_agent::core::config::ScanRequest;
use disk_survey_agent::scanner::walker::ScanEngine;

/// Self-cleaning fixture tree rooted under `target/`, not the system temp
/// directory: fixture paths must never contain the cleanup classifier's
/// temp-path markers (`/tmp/`, `/var/folders/`).
pub fn fixture_dir(prefix: &str) -> tempfile::TempDir {
    let base = Path::new(env!("CARGO_MANIFEST_DIR")).join("target/test-fixtures");
    std::fs::create_dir_all(&base).expect("create fixture base");
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir_in(&base)
        .expect("fixture dir")
}

/// Write a real file of `size` bytes. Sparse for large sizes, so tests can
/// use realistic byte counts without touching that much disk.
pub fn build_file(path: &Path, size: u64) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dirs");
    }
    let file = File::create(path).expect("create file");
    file.set_len(size).expect("set file length");
}

/// Engine with trash estimation disabled, so host trash contents never
/// leak into assertions.
pub fn engine() -> ScanEngine {
    ScanEngine::new().with_trash_paths(Vec::new())
}

/// Request with generous budgets for small-tree tests.
pub fn request(root: &Path) -> ScanRequest {
    ScanRequest {
        timeout_seconds: Some(60),
        ..ScanRequest::new(root.to_path_buf())
    }
}

/// Back-date a file's mtime by `days`.
pub fn age_file(path: &Path, days: u64) {
    let then = std::time::SystemTime::now() - std::time::Duration::from_secs(days * 24 * 60 * 60);
    filetime::set_file_mtime(path, filetime::FileTime::from_system_time(then))
        .expect("set mtime");
}

/// The canonical key the engine will report for a scan root.
pub fn canonical_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).expect("canonicalize")
}
