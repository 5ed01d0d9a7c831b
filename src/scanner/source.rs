//! Directory-entry lister seam between the engine and the operating system.
//!
//! The traversal engine only ever touches the filesystem through
//! [`EntrySource`], so tests can substitute synthetic or failing sources and
//! the engine itself stays free of platform branches.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// What kind of object a directory entry resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Anything else (socket, fifo, device, unresolved symlink).
    Other,
}

/// One immediate child of a listed directory.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    /// Base name within the parent directory.
    pub name: String,
    /// Resolved kind. For an unfollowed symlink this is [`EntryKind::Other`].
    pub kind: EntryKind,
    /// Size in bytes; zero for directories and unresolved symlinks.
    pub size_bytes: u64,
    /// Last modification time, when the platform reports one.
    pub modified: Option<SystemTime>,
    /// Whether the entry itself is a symlink (before any resolution).
    pub is_symlink: bool,
}

/// Result of listing one directory: resolved entries plus per-entry failures.
///
/// A failure here is the per-entry case (stat on one child failed); a failure
/// of the listing itself is the `io::Result` error of [`EntrySource::list_dir`].
#[derive(Debug, Default)]
pub struct DirListing {
    /// Entries whose metadata resolved.
    pub entries: Vec<EntryInfo>,
    /// `(child path, error)` pairs for entries that could not be examined.
    pub entry_errors: Vec<(PathBuf, io::Error)>,
}

/// Filesystem access used by the traversal engine and trash estimator.
pub trait EntrySource: Send + Sync {
    /// List the immediate entries of `path` without following symlinks.
    fn list_dir(&self, path: &Path) -> io::Result<DirListing>;

    /// Stat `path`, following symlinks. Used for symlink-target resolution
    /// and for the scan-root precondition check.
    fn stat_follow(&self, path: &Path) -> io::Result<EntryInfo>;

    /// Canonical form of `path`, resolving symlinks. Used to key the visited
    /// set when a symlinked directory is followed, so a target reachable via
    /// several links is queued at most once.
    fn canonical(&self, path: &Path) -> io::Result<PathBuf>;
}

/// [`EntrySource`] backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntrySource;

impl EntrySource for OsEntrySource {
    fn list_dir(&self, path: &Path) -> io::Result<DirListing> {
        let mut listing = DirListing::default();
        for entry in fs::read_dir(path)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    listing.entry_errors.push((path.to_path_buf(), err));
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            // DirEntry::metadata does not traverse symlinks.
            match entry.metadata() {
                Ok(metadata) => listing.entries.push(entry_info(name, &metadata)),
                Err(err) => listing.entry_errors.push((entry.path(), err)),
            }
        }
        Ok(listing)
    }

    fn stat_follow(&self, path: &Path) -> io::Result<EntryInfo> {
        let metadata = fs::metadata(path)?;
        let name = path
            .file_name()
            .map_or_else(|| path.to_string_lossy().into_owned(), |n| {
                n.to_string_lossy().into_owned()
            });
        Ok(entry_info(name, &metadata))
    }

    fn canonical(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }
}

fn entry_info(name: String, metadata: &fs::Metadata) -> EntryInfo {
    let file_type = metadata.file_type();
    let kind = if file_type.is_symlink() {
        EntryKind::Other
    } else if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    };
    EntryInfo {
        name,
        kind,
        size_bytes: if kind == EntryKind::File {
            metadata.len()
        } else {
            0
        },
        modified: metadata.modified().ok(),
        is_symlink: file_type.is_symlink(),
    }
}
