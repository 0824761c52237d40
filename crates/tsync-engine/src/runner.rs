//! One sync run: fetch → redact → reconcile, with bounded concurrency

use std::future::Future;
use std::sync::Arc;

use futures_util::{StreamExt, future, stream};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tsync_core::{RunSummary, SyncOutcome, Ticket};
use tsync_security::RedactionEngine;
use tsync_sources::TicketSource;
use uuid::Uuid;

use crate::audit::{AuditEntry, AuditSink};
use crate::reconcile::ReconciliationEngine;

pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketReport {
    pub ticket_id: String,
    pub outcome: SyncOutcome,
    /// Number of sensitive findings redacted before sync
    pub findings: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub run_by: String,
    pub summary: RunSummary,
    /// Tickets fetched but never started because the run was cancelled
    pub not_started: usize,
    /// Whether the source was told the batch is done. Unfinished batches
    /// are fetched again next run.
    pub checkpoint_committed: bool,
    pub tickets: Vec<TicketReport>,
}

pub struct SyncRunner {
    source: Arc<dyn TicketSource>,
    redactor: Arc<RedactionEngine>,
    engine: Arc<ReconciliationEngine>,
    audit: Arc<dyn AuditSink>,
    concurrency: usize,
    cancel: CancellationToken,
}

impl SyncRunner {
    pub fn new(
        source: Arc<dyn TicketSource>,
        redactor: Arc<RedactionEngine>,
        engine: Arc<ReconciliationEngine>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            source,
            redactor,
            engine,
            audit,
            concurrency: DEFAULT_CONCURRENCY,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Cancelling stops new tickets from starting; in-flight ones finish.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run one full pass. Never fails: a source failure yields an empty
    /// batch and the summary is always produced.
    ///
    /// The source is committed only when every fetched ticket ran and none
    /// failed, and never on a dry run.
    pub async fn run(&self) -> RunReport {
        let run_id = Uuid::new_v4();
        let run_by = run_identity();
        info!(%run_id, run_by = %run_by, dry_run = self.engine.is_dry_run(), "sync started");

        let (tickets, fetched_ok) = match self.source.fetch_tickets().await {
            Ok(tickets) => (tickets, true),
            Err(e) => {
                error!(%run_id, error = %e, "failed to fetch tickets");
                (Vec::new(), false)
            }
        };
        let fetched = tickets.len();

        let reports = self.reconcile_all(run_id, tickets).await;
        let summary = RunSummary::from_outcomes(reports.iter().map(|r| &r.outcome));
        let not_started = fetched - reports.len();

        let finished = fetched_ok && not_started == 0 && summary.failed == 0;
        let checkpoint_committed = if finished && !self.engine.is_dry_run() {
            self.commit(run_id).await
        } else {
            if fetched_ok {
                info!(
                    %run_id,
                    failed = summary.failed,
                    not_started,
                    dry_run = self.engine.is_dry_run(),
                    "checkpoint not advanced; tickets will be fetched again"
                );
            }
            false
        };

        info!(
            %run_id,
            run_by = %run_by,
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped,
            failed = summary.failed,
            not_started,
            "sync completed"
        );

        RunReport {
            run_id,
            run_by,
            summary,
            not_started,
            checkpoint_committed,
            tickets: reports,
        }
    }

    async fn commit(&self, run_id: Uuid) -> bool {
        match self.source.commit().await {
            Ok(()) => true,
            Err(e) => {
                warn!(%run_id, error = %e, "failed to commit sync checkpoint");
                false
            }
        }
    }

    /// Reconcile a batch; one report per started ticket, in completion order
    pub async fn reconcile_all(&self, run_id: Uuid, tickets: Vec<Ticket>) -> Vec<TicketReport> {
        let cancel = self.cancel.clone();
        stream::iter(tickets)
            .take_while(move |_| future::ready(!cancel.is_cancelled()))
            .map(|ticket| self.spawn_ticket(run_id, ticket))
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }

    fn spawn_ticket(
        &self,
        run_id: Uuid,
        ticket: Ticket,
    ) -> impl Future<Output = TicketReport> + use<> {
        let ticket_id = ticket.id.clone();
        let redactor = self.redactor.clone();
        let engine = self.engine.clone();
        let audit = self.audit.clone();

        let task = tokio::spawn(async move {
            let (findings, redacted) = redactor.scan_and_redact(&ticket);
            let outcome = engine.reconcile(&redacted).await;
            (findings.values().map(Vec::len).sum::<usize>(), outcome)
        });

        async move {
            let (findings, outcome) = match task.await {
                Ok(result) => result,
                Err(e) => {
                    error!(ticket_id = %ticket_id, error = %e, "ticket task aborted");
                    (0, SyncOutcome::failed(format!("ticket task aborted: {}", e)))
                }
            };
            audit.record(&AuditEntry::new(run_id, &ticket_id, &outcome));

            TicketReport {
                ticket_id,
                outcome,
                findings,
            }
        }
    }
}

/// `user@host` of whoever runs the sync, from the environment
pub fn run_identity() -> String {
    identity_from(|key| std::env::var(key).ok())
}

fn identity_from(lookup: impl Fn(&str) -> Option<String>) -> String {
    let first = |keys: &[&str]| {
        keys.iter()
            .filter_map(|k| lookup(k))
            .find(|v| !v.trim().is_empty())
    };

    match (first(&["USER", "USERNAME"]), first(&["HOSTNAME", "COMPUTERNAME"])) {
        (Some(user), Some(host)) => format!("{}@{}", user, host),
        (Some(user), None) => user,
        _ => "unknown_user".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_from_env() {
        let id = identity_from(|key| match key {
            "USER" => Some("svc-sync".to_string()),
            "HOSTNAME" => Some("worker-1".to_string()),
            _ => None,
        });
        assert_eq!(id, "svc-sync@worker-1");
    }

    #[test]
    fn test_identity_fallbacks() {
        let windows = identity_from(|key| match key {
            "USERNAME" => Some("alice".to_string()),
            "COMPUTERNAME" => Some("DESKTOP".to_string()),
            _ => None,
        });
        assert_eq!(windows, "alice@DESKTOP");

        let user_only = identity_from(|key| (key == "USER").then(|| "bob".to_string()));
        assert_eq!(user_only, "bob");

        assert_eq!(identity_from(|_| None), "unknown_user");
    }
}
