//! Sync orchestration for tsync
//!
//! - [`ReconciliationEngine`]: per-ticket create/update/skip decision
//! - [`SyncRunner`]: fetch, redact and reconcile a batch with bounded concurrency
//! - [`AuditSink`]: where per-ticket outcomes are reported

pub mod audit;
pub mod payload;
pub mod reconcile;
pub mod runner;

pub use audit::{AuditEntry, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use payload::{PARENT_LINK_COMMENT, create_payload, update_payload};
pub use reconcile::{ReconciliationEngine, SKIP_UNCHANGED};
pub use runner::{DEFAULT_CONCURRENCY, RunReport, SyncRunner, TicketReport, run_identity};
