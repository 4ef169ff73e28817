//! User-visible activity log.
//!
//! Every stage of the ingestion pipeline reports here. Entries are kept
//! newest first for the whole session and are never trimmed; nothing is
//! persisted. Each entry is also mirrored to diagnostic tracing.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::Local;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Danger,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.write_str("info"),
            Severity::Success => f.write_str("success"),
            Severity::Danger => f.write_str("danger"),
        }
    }
}

/// One immutable log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Wall-clock time of day, `HH:MM:SS`.
    pub timestamp: String,
    pub message: String,
    pub severity: Severity,
}

impl LogEntry {
    pub fn now(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            message: message.into(),
            severity,
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp, self.message)
    }
}

/// Cloneable handle to the session's activity log.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` at the front of the log.
    pub fn log(&self, message: impl Into<String>, severity: Severity) {
        let entry = LogEntry::now(message, severity);
        match severity {
            Severity::Danger => warn!(target: "activity", severity = %severity, "{}", entry.message),
            _ => info!(target: "activity", severity = %severity, "{}", entry.message),
        }
        self.lock().push_front(entry);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(message, Severity::Info);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.log(message, Severity::Success);
    }

    pub fn danger(&self, message: impl Into<String>) {
        self.log(message, Severity::Danger);
    }

    /// Snapshot of all entries, most recent first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<LogEntry> {
        self.lock().front().cloned()
    }

    pub fn contains(&self, message: &str) -> bool {
        self.lock().iter().any(|e| e.message == message)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave a half-written entry, so a
    // poisoned mutex is still safe to read.
    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<LogEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_entry_is_always_first() {
        let log = ActivityLog::new();
        for i in 0..50 {
            log.info(format!("entry {i}"));
            assert_eq!(log.latest().unwrap().message, format!("entry {i}"));
        }
        let entries = log.entries();
        assert_eq!(entries.len(), 50);
        assert_eq!(entries[0].message, "entry 49");
        assert_eq!(entries[49].message, "entry 0");
    }

    #[test]
    fn severity_is_preserved() {
        let log = ActivityLog::new();
        log.success("ok");
        log.danger("bad");
        let entries = log.entries();
        assert_eq!(entries[0].severity, Severity::Danger);
        assert_eq!(entries[1].severity, Severity::Success);
    }

    #[test]
    fn timestamp_is_time_of_day() {
        let entry = LogEntry::now("x", Severity::Info);
        let parts: Vec<&str> = entry.timestamp.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_digit())));
    }

    #[test]
    fn clones_share_entries() {
        let log = ActivityLog::new();
        let other = log.clone();
        other.info("from clone");
        assert!(log.contains("from clone"));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn display_matches_panel_format() {
        let entry = LogEntry {
            timestamp: "09:15:02".to_string(),
            message: "Ingesting a.csv...".to_string(),
            severity: Severity::Info,
        };
        assert_eq!(entry.to_string(), "[09:15:02] Ingesting a.csv...");
    }
}
