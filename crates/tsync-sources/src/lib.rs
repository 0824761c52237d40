//! Remote collaborators for tsync
//!
//! This crate provides:
//! - The capability traits the engine consumes ([`TicketSource`], [`WorkTracker`])
//! - A helpdesk REST source with an incremental checkpoint
//! - An Azure Boards work-item tracker

pub mod azure;
pub mod checkpoint;
pub mod error;
pub mod handler;
pub mod helpdesk;

pub use azure::{AzureBoardsClient, AzureBoardsSettings};
pub use checkpoint::SyncCheckpoint;
pub use error::{Result, SourceError};
pub use handler::{TicketSource, WorkTracker};
pub use helpdesk::HelpdeskClient;
