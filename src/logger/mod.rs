//! Scan-event logging: JSONL append-only with graceful degradation.

pub mod jsonl;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use jsonl::JsonlLogger;

/// Severity of a scan event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Routine lifecycle events.
    Info,
    /// Degraded but continuing.
    Warn,
    /// Failures worth an operator's attention.
    Error,
}

/// One structured scan event.
#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    /// Event time, RFC 3339 UTC.
    pub timestamp: DateTime<Utc>,
    /// Severity.
    pub level: LogLevel,
    /// Emitting component, e.g. `scanner`.
    pub component: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Free-form structured payload.
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub fields: serde_json::Value,
}

impl LogEvent {
    /// Event with no structured payload.
    #[must_use]
    pub fn new(level: LogLevel, component: &'static str, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            component,
            message: message.into(),
            fields: serde_json::Value::Null,
        }
    }

    /// Attach a structured payload.
    #[must_use]
    pub fn with_fields(mut self, fields: serde_json::Value) -> Self {
        self.fields = fields;
        self
    }
}

/// Sink for scan events.
pub trait ScanLogger: Send + Sync {
    /// Record one event. Must never fail the caller.
    fn record(&self, event: LogEvent);
}

/// No-op sink used when no log destination is configured.
#[derive(Debug, Default)]
pub struct NullLogger;

impl ScanLogger for NullLogger {
    fn record(&self, _event: LogEvent) {}
}
