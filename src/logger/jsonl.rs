//! Append-only JSONL event sink.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use parking_lot::Mutex;

use crate::core::errors::{DsaError, Result};
use crate::logger::{LogEvent, ScanLogger};

/// Writes one JSON object per line to an append-only file.
///
/// A write failure permanently degrades the sink to a no-op: losing log
/// lines must never fail or slow a scan.
#[derive(Debug)]
pub struct JsonlLogger {
    file: Mutex<Option<File>>,
}

impl JsonlLogger {
    /// Open (creating if needed) the log file in append mode.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|err| DsaError::io(parent, err))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| DsaError::io(path, err))?;
        Ok(Self {
            file: Mutex::new(Some(file)),
        })
    }

    /// Whether the sink has degraded to a no-op.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.file.lock().is_none()
    }
}

impl ScanLogger for JsonlLogger {
    fn record(&self, event: LogEvent) {
        let Ok(line) = serde_json::to_string(&event) else {
            return;
        };
        let mut slot = self.file.lock();
        if let Some(file) = slot.as_mut()
            && writeln!(file, "{line}").is_err()
        {
            // Degrade permanently; later events are dropped.
            *slot = None;
        }
    }
}
