//! Sync audit trail
//!
//! The engine reports one entry per ticket outcome through an injected
//! [`AuditSink`]; it never configures logging itself.

use std::sync::Mutex;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::info;
use tsync_core::{RemoteId, SyncOutcome};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub run_id: Uuid,
    pub ticket_id: String,
    pub action: &'static str,
    pub remote_id: Option<RemoteId>,
    /// Skip reason or failure message
    pub detail: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl AuditEntry {
    pub fn new(run_id: Uuid, ticket_id: &str, outcome: &SyncOutcome) -> Self {
        let detail = match outcome {
            SyncOutcome::Skipped { reason } => Some(reason.clone()),
            SyncOutcome::Failed { error } => Some(error.clone()),
            _ => None,
        };

        Self {
            run_id,
            ticket_id: ticket_id.to_string(),
            action: outcome.action(),
            remote_id: outcome.remote_id(),
            detail,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, entry: &AuditEntry);
}

/// Emits entries as `info` events under the `tsync::audit` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, entry: &AuditEntry) {
        info!(
            target: "tsync::audit",
            run_id = %entry.run_id,
            ticket_id = %entry.ticket_id,
            action = entry.action,
            remote_id = entry.remote_id.map(|id| id.0),
            detail = entry.detail.as_deref(),
            timestamp = %entry.timestamp,
            "sync outcome"
        );
    }
}

/// Keeps entries in memory
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: &AuditEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry.clone());
        }
    }
}
