//! Per-ticket reconciliation against the work tracker
//!
//! Each ticket goes through `lookup → (create | decide → (update | skip))`
//! and ends in exactly one [`SyncOutcome`].
//!
//! Failure policy when a read fails or times out:
//! - lookup: the ticket is treated as not found and a new item is created.
//!   A transient failure can therefore create a duplicate, but never drops
//!   the ticket silently.
//! - remote last-modified: treated as 0, so the ticket is updated.
//! - parent link check: treated as not linked, so the link is sent again.
//!
//! Every fallback is logged at `warn`. Failed create or update calls are
//! never retried inside a run.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use tsync_core::{RemoteId, SyncOutcome, Ticket};
use tsync_sources::{SourceError, WorkTracker};

use crate::payload::{create_payload, update_payload};

pub const SKIP_UNCHANGED: &str = "unchanged";

pub struct ReconciliationEngine {
    tracker: Arc<dyn WorkTracker>,
    timeout: Duration,
    dry_run: bool,
}

impl ReconciliationEngine {
    /// `timeout` bounds every individual tracker call
    pub fn new(tracker: Arc<dyn WorkTracker>, timeout: Duration) -> Self {
        Self {
            tracker,
            timeout,
            dry_run: false,
        }
    }

    /// Perform lookups but report mutations as skipped
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Reconcile one (already redacted) ticket
    pub async fn reconcile(&self, ticket: &Ticket) -> SyncOutcome {
        let Some(remote_id) = self.lookup(ticket).await else {
            return self.create(ticket).await;
        };

        let remote_last_modified = self.remote_last_modified(ticket, remote_id).await;
        if ticket.update_time > remote_last_modified {
            self.update(ticket, remote_id).await
        } else {
            debug!(
                ticket_id = %ticket.id,
                remote_id = %remote_id,
                update_time = ticket.update_time,
                remote_last_modified,
                "ticket unchanged since last remote update"
            );
            SyncOutcome::skipped(SKIP_UNCHANGED)
        }
    }

    async fn call<T>(&self, fut: impl Future<Output = Result<T, SourceError>>) -> Result<T, SourceError> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .unwrap_or(Err(SourceError::Timeout(self.timeout)))
    }

    async fn lookup(&self, ticket: &Ticket) -> Option<RemoteId> {
        match self.call(self.tracker.find_by_external_id(&ticket.id)).await {
            Ok(found) => found,
            Err(e) => {
                warn!(
                    ticket_id = %ticket.id,
                    error = %e,
                    "work item lookup failed; treating ticket as new"
                );
                None
            }
        }
    }

    async fn remote_last_modified(&self, ticket: &Ticket, remote_id: RemoteId) -> i64 {
        match self.call(self.tracker.get_remote_last_modified(remote_id)).await {
            Ok(ts) => ts,
            Err(e) => {
                warn!(
                    ticket_id = %ticket.id,
                    remote_id = %remote_id,
                    error = %e,
                    "could not read remote last-modified time; assuming oldest"
                );
                0
            }
        }
    }

    async fn create(&self, ticket: &Ticket) -> SyncOutcome {
        if self.dry_run {
            return SyncOutcome::skipped("dry-run: would create");
        }

        let payload = create_payload(ticket);
        match self.call(self.tracker.create_remote_item(&payload)).await {
            Ok(remote_id) => SyncOutcome::Created { remote_id },
            Err(e) => {
                warn!(ticket_id = %ticket.id, error = %e, "failed to create work item");
                SyncOutcome::failed(e)
            }
        }
    }

    async fn update(&self, ticket: &Ticket, remote_id: RemoteId) -> SyncOutcome {
        let link_parent = match &ticket.parent_id {
            Some(parent_id) => !self.already_linked(ticket, remote_id, parent_id).await,
            None => false,
        };

        if self.dry_run {
            return SyncOutcome::skipped(format!("dry-run: would update {}", remote_id));
        }

        let payload = update_payload(ticket, link_parent);
        match self.call(self.tracker.update_remote_item(remote_id, &payload)).await {
            Ok(()) => SyncOutcome::Updated { remote_id },
            Err(e) => {
                warn!(
                    ticket_id = %ticket.id,
                    remote_id = %remote_id,
                    error = %e,
                    "failed to update work item"
                );
                SyncOutcome::failed(e)
            }
        }
    }

    async fn already_linked(&self, ticket: &Ticket, remote_id: RemoteId, parent_id: &str) -> bool {
        match self.call(self.tracker.has_existing_link(remote_id, parent_id)).await {
            Ok(linked) => linked,
            Err(e) => {
                warn!(
                    ticket_id = %ticket.id,
                    remote_id = %remote_id,
                    parent_id,
                    error = %e,
                    "parent link check failed; linking anyway"
                );
                false
            }
        }
    }
}
