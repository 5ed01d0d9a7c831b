//! Path normalization helpers shared by the scanner and its classifiers.

use std::path::{Component, Path, PathBuf};

/// Stable string key for a path, used for aggregate-table and visited-set
/// lookups. Lossy on non-UTF-8 names, which is acceptable for reporting.
#[must_use]
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Lowercased, forward-slash form of a path for substring and shape matching.
///
/// Matching rules never touch the filesystem, so this is purely syntactic:
/// `C:\Users\Bob\Downloads\x.zip` becomes `c:/users/bob/downloads/x.zip`.
#[must_use]
pub fn normalize_for_match(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

/// Resolve a path to an absolute form, preferring the kernel's view.
///
/// Falls back to syntactic normalization (collapsing `.` and `..`) when
/// canonicalization fails, e.g. for paths whose intermediate components do
/// not exist yet.
#[must_use]
pub fn resolve_absolute_path(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| normalize_syntactic(path))
}

fn normalize_syntactic(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    resolved
}
