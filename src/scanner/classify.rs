//! Pure path classifiers: cleanup categories, stale downloads, unrotated
//! logs, and duplicate-candidate keys.
//!
//! Every function here is stateless and purely syntactic over a normalized
//! (lowercased, forward-slash) path, so workers can classify entries without
//! holding the traversal lock.

use std::path::Path;
use std::sync::LazyLock;
use std::time::{Duration, SystemTime};

use regex::Regex;

use crate::core::paths::normalize_for_match;

/// Cleanup category for well-known temporary directories.
pub const CATEGORY_TEMP: &str = "temp_files";
/// Cleanup category for browser cache trees.
pub const CATEGORY_BROWSER_CACHE: &str = "browser_cache";
/// Cleanup category for package-manager caches.
pub const CATEGORY_PACKAGE_CACHE: &str = "package_cache";
/// Synthesized category for trash/recycle-bin usage.
pub const CATEGORY_TRASH: &str = "trash";

/// Age past which a download is considered stale.
pub const OLD_DOWNLOAD_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);
/// Minimum size for a `.log` file to count as unrotated.
pub const UNROTATED_LOG_MIN_BYTES: u64 = 100 * 1024 * 1024;

const TEMP_MARKERS: &[&str] = &["/tmp/", "/temp/", "/var/folders/"];

const BROWSER_CACHE_MARKERS: &[&str] = &[
    "/.cache/google-chrome/",
    "/.cache/chromium/",
    "/.cache/mozilla/",
    "/library/caches/google/",
    "/library/caches/com.apple.safari/",
    "/appdata/local/google/chrome/",
    "/appdata/local/microsoft/edge/",
    "/appdata/local/mozilla/firefox/",
];

const PACKAGE_CACHE_MARKERS: &[&str] = &[
    "/.npm/",
    "/.yarn/cache/",
    "/node_modules/.cache/",
    "/.cargo/registry/",
    "/.cargo/git/",
    "/.gradle/caches/",
    "/.m2/repository/",
    "/.cache/pip/",
    "/pip/cache/",
    "/.nuget/packages/",
    "/go/pkg/mod/cache/",
    "/library/caches/homebrew/",
];

// Matches a downloads segment under a per-user home root, after
// normalization: /users/<u>/..., /home/<u>/..., or <drive>:/users/<u>/...
static DOWNLOADS_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|/)(users|home)/[^/]+/(.*/)?downloads/").expect("downloads shape pattern")
});

/// Cleanup category for a path, or `""` when none applies.
///
/// Priority order: temp directories, browser caches, package-manager caches.
#[must_use]
pub fn cleanup_category(path: &Path) -> &'static str {
    let normalized = normalize_for_match(path);
    if TEMP_MARKERS.iter().any(|m| normalized.contains(m)) {
        CATEGORY_TEMP
    } else if BROWSER_CACHE_MARKERS.iter().any(|m| normalized.contains(m)) {
        CATEGORY_BROWSER_CACHE
    } else if PACKAGE_CACHE_MARKERS.iter().any(|m| normalized.contains(m)) {
        CATEGORY_PACKAGE_CACHE
    } else {
        ""
    }
}

/// Whether a file looks like a download nobody came back for.
///
/// Requires a positive size, an mtime older than [`OLD_DOWNLOAD_AGE`], a path
/// that is not itself a cache location, and a `.../downloads/...` segment
/// under a recognized per-user home root.
#[must_use]
pub fn is_old_download(
    path: &Path,
    size_bytes: u64,
    modified: Option<SystemTime>,
    now: SystemTime,
) -> bool {
    if size_bytes == 0 {
        return false;
    }
    let Some(modified) = modified else {
        return false;
    };
    let old_enough = now
        .duration_since(modified)
        .is_ok_and(|age| age > OLD_DOWNLOAD_AGE);
    if !old_enough {
        return false;
    }
    if !cleanup_category(path).is_empty() {
        return false;
    }
    DOWNLOADS_SHAPE.is_match(&normalize_for_match(path))
}

/// Whether a file is a log that apparently never rotates.
#[must_use]
pub fn is_unrotated_log(path: &Path, size_bytes: u64) -> bool {
    size_bytes >= UNROTATED_LOG_MIN_BYTES && normalize_for_match(path).ends_with(".log")
}

/// Basename normalized for duplicate grouping: lowercased, with trailing
/// `(copy)` / `- copy` markers stripped from the stem.
#[must_use]
pub fn duplicate_base_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let (raw_stem, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 => name.split_at(dot),
        _ => (name.as_str(), ""),
    };

    let mut stem = raw_stem.trim_end();
    loop {
        let before = stem;
        for marker in ["(copy)", "- copy", "-copy"] {
            if let Some(stripped) = stem.strip_suffix(marker) {
                stem = stripped.trim_end();
            }
        }
        if stem == before {
            break;
        }
    }
    format!("{stem}{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::PathBuf;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn ago(now: SystemTime, days: u64) -> SystemTime {
        now - DAY * u32::try_from(days).expect("days fits u32")
    }

    #[test]
    fn temp_wins_over_other_categories() {
        assert_eq!(cleanup_category(Path::new("/data/tmp/a.tmp")), CATEGORY_TEMP);
        assert_eq!(
            cleanup_category(Path::new("/home/u/.cache/pip/wheel.whl")),
            CATEGORY_PACKAGE_CACHE
        );
        assert_eq!(
            cleanup_category(Path::new(
                "C:\\Users\\bob\\AppData\\Local\\Google\\Chrome\\Cache\\f_0001"
            )),
            CATEGORY_BROWSER_CACHE
        );
        assert_eq!(cleanup_category(Path::new("/srv/www/index.html")), "");
    }

    #[test]
    fn old_download_requires_the_home_downloads_shape() {
        let now = SystemTime::now();
        let old = Some(ago(now, 60));

        assert!(is_old_download(
            Path::new("/home/alice/downloads/iso/distro.iso"),
            1024,
            old,
            now
        ));
        assert!(is_old_download(
            Path::new("C:\\Users\\bob\\Downloads\\setup.exe"),
            1024,
            old,
            now
        ));
        // Wrong path shape: not under a user downloads directory.
        assert!(!is_old_download(
            Path::new("/data/archive/old.zip"),
            1024,
            old,
            now
        ));
        // Cache locations are never downloads.
        assert!(!is_old_download(
            Path::new("/home/alice/downloads/tmp/x.part"),
            1024,
            old,
            now
        ));
    }

    #[test]
    fn old_download_requires_age_and_size() {
        let now = SystemTime::now();
        let path = Path::new("/home/alice/downloads/movie.mkv");
        assert!(!is_old_download(path, 0, Some(ago(now, 60)), now));
        assert!(!is_old_download(path, 1024, Some(ago(now, 5)), now));
        assert!(!is_old_download(path, 1024, None, now));
    }

    #[test]
    fn unrotated_log_needs_size_and_suffix() {
        assert!(is_unrotated_log(
            Path::new("/data/big.log"),
            150 * 1024 * 1024
        ));
        assert!(!is_unrotated_log(Path::new("/data/big.log"), 1024));
        assert!(!is_unrotated_log(
            Path::new("/data/big.log.1"),
            150 * 1024 * 1024
        ));
    }

    #[test]
    fn duplicate_base_name_strips_copy_markers() {
        assert_eq!(
            duplicate_base_name(Path::new("/a/report (copy).txt")),
            "report.txt"
        );
        assert_eq!(
            duplicate_base_name(Path::new("/b/Report - Copy.txt")),
            "report.txt"
        );
        assert_eq!(duplicate_base_name(Path::new("/c/REPORT.TXT")), "report.txt");
        assert_eq!(duplicate_base_name(Path::new("/d/.hidden")), ".hidden");
        assert_eq!(duplicate_base_name(Path::new("/e/no_ext")), "no_ext");
    }

    proptest! {
        #[test]
        fn duplicate_base_name_is_idempotent(name in "[a-z0-9 ._()-]{1,40}") {
            let once = duplicate_base_name(&PathBuf::from(&name));
            let twice = duplicate_base_name(&PathBuf::from(&once));
            prop_assert_eq!(once, twice);
        }
    }
}
