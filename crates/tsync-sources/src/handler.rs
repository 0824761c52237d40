//! Collaborator capabilities consumed by the reconciliation engine

use async_trait::async_trait;
use tsync_core::{RemoteId, RemotePayload, Ticket};

use crate::Result;

/// Source of helpdesk tickets
#[async_trait]
pub trait TicketSource: Send + Sync {
    /// The batch to reconcile. May be a partial page set.
    async fn fetch_tickets(&self) -> Result<Vec<Ticket>>;

    /// Mark the last fetched batch as fully reconciled so later fetches may
    /// skip it. Until this is called the same tickets are fetched again.
    async fn commit(&self) -> Result<()> {
        Ok(())
    }
}

/// Work-tracking system the tickets are mirrored into
#[async_trait]
pub trait WorkTracker: Send + Sync {
    /// Remote item carrying this helpdesk id, if any
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<RemoteId>>;

    /// Last-modified time of a remote item, epoch milliseconds
    async fn get_remote_last_modified(&self, remote_id: RemoteId) -> Result<i64>;

    async fn create_remote_item(&self, payload: &RemotePayload) -> Result<RemoteId>;

    async fn update_remote_item(&self, remote_id: RemoteId, payload: &RemotePayload) -> Result<()>;

    /// Whether `remote_id` already links to `parent_id` as its parent
    async fn has_existing_link(&self, remote_id: RemoteId, parent_id: &str) -> Result<bool>;
}
