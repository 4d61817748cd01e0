//! Audit trail of accepted, rejected and failed queries.
//!
//! `AuditLog` is constructed once at startup and injected into the executor.
//! Entries go to an `AuditSink`: in production the tracing sink, which lands
//! in the rotating log file; in tests an in-memory sink.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Tracing target used for audit events.
pub const AUDIT_TARGET: &str = "audit";

/// Severity of an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A single audit record.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub severity: Severity,
    pub message: String,
}

impl AuditEntry {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

/// Destination for audit entries.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry);
}

/// Emits entries as tracing events under the `audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn record(&self, entry: AuditEntry) {
        match entry.severity {
            Severity::Info => tracing::info!(target: AUDIT_TARGET, "{}", entry.message),
            Severity::Warning => tracing::warn!(target: AUDIT_TARGET, "{}", entry.message),
            Severity::Error => tracing::error!(target: AUDIT_TARGET, "{}", entry.message),
        }
    }
}

/// Keeps entries in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries recorded so far.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemorySink {
    fn record(&self, entry: AuditEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }
}

/// Audit logger with one helper per query outcome.
#[derive(Clone)]
pub struct AuditLog {
    sink: Arc<dyn AuditSink>,
}

impl AuditLog {
    /// Creates an audit log writing to the given sink.
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Creates an audit log backed by tracing.
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingSink))
    }

    /// Records a successfully executed statement.
    pub fn query_executed(&self, statement: &str, row_count: usize, elapsed: Duration) {
        self.sink.record(AuditEntry::new(
            Severity::Info,
            format!(
                "Query executed successfully ({row_count} rows in {} ms): {statement}",
                elapsed.as_millis()
            ),
        ));
    }

    /// Records a query refused by the read-only gate.
    pub fn query_rejected(&self, query: &str, reason: impl fmt::Display) {
        self.sink.record(AuditEntry::new(
            Severity::Warning,
            format!("Rejected unauthorized query ({reason}): {query}"),
        ));
    }

    /// Records a statement that failed in the database layer.
    pub fn query_failed(&self, statement: &str, error: impl fmt::Display) {
        self.sink.record(AuditEntry::new(
            Severity::Error,
            format!("Error executing query: {statement} - Error: {error}"),
        ));
    }
}

impl fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditLog").finish_non_exhaustive()
    }
}
