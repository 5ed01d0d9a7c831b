//! DSA-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, DsaError>;

/// Top-level error type for the Disk Survey Agent.
#[derive(Debug, Error)]
pub enum DsaError {
    #[error("[DSA-1001] invalid scan request: {details}")]
    InvalidRequest { details: String },

    #[error("[DSA-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[DSA-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[DSA-2001] scan root does not exist: {path}")]
    ScanRootMissing { path: PathBuf },

    #[error("[DSA-2002] scan root is not a directory: {path}")]
    ScanRootNotDirectory { path: PathBuf },

    #[error("[DSA-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[DSA-3001] permission denied for {path}")]
    PermissionDenied { path: PathBuf },

    #[error("[DSA-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[DSA-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl DsaError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "DSA-1001",
            Self::MissingConfig { .. } => "DSA-1002",
            Self::ConfigParse { .. } => "DSA-1003",
            Self::ScanRootMissing { .. } => "DSA-2001",
            Self::ScanRootNotDirectory { .. } => "DSA-2002",
            Self::Serialization { .. } => "DSA-2101",
            Self::PermissionDenied { .. } => "DSA-3001",
            Self::Io { .. } => "DSA-3002",
            Self::Runtime { .. } => "DSA-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Runtime { .. })
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for DsaError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for DsaError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_and_embedded_in_display() {
        let err = DsaError::ScanRootMissing {
            path: PathBuf::from("/nope"),
        };
        assert_eq!(err.code(), "DSA-2001");
        assert!(err.to_string().contains("[DSA-2001]"));
    }

    #[test]
    fn io_errors_are_retryable_but_permission_denied_is_not() {
        let io = DsaError::io("/x", std::io::Error::other("disk on fire"));
        assert!(io.is_retryable());
        let denied = DsaError::PermissionDenied {
            path: PathBuf::from("/x"),
        };
        assert!(!denied.is_retryable());
    }
}
