//! Platform-specific path discovery: trash locations and the home root.
//!
//! The traversal engine never branches on the OS; it consumes whatever
//! candidate list this module (or the caller) hands it. Candidates that do
//! not exist are skipped silently by the trash estimator.

use std::path::PathBuf;

/// Current user's home directory, from the environment.
#[must_use]
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Candidate trash/recycle-bin locations for this platform.
#[must_use]
pub fn default_trash_paths() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    #[cfg(target_os = "macos")]
    if let Some(home) = home_dir() {
        candidates.push(home.join(".Trash"));
    }

    #[cfg(target_os = "windows")]
    {
        let drive = std::env::var_os("SystemDrive")
            .map_or_else(|| PathBuf::from("C:"), PathBuf::from);
        candidates.push(drive.join("$Recycle.Bin"));
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        if let Some(data_home) = std::env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
            candidates.push(PathBuf::from(data_home).join("Trash/files"));
        } else if let Some(home) = home_dir() {
            candidates.push(home.join(".local/share/Trash/files"));
        }
    }

    candidates
}
