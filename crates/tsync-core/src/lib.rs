//! Core domain models for tsync
//!
//! This crate contains:
//! - Domain models (Ticket, Finding, RemoteWorkItem, SyncOutcome)
//! - Priority mapping between the helpdesk and the work tracker
//! - The transport-neutral payload sent to the work tracker

pub mod error;
pub mod finding;
pub mod outcome;
pub mod payload;
pub mod priority;
pub mod ticket;
pub mod work_item;

pub use error::{CoreError, Result};
pub use finding::{Finding, FindingsByField};
pub use outcome::{RunSummary, SyncOutcome};
pub use payload::{ParentLink, RemotePayload};
pub use priority::{Priority, map_priority};
pub use ticket::Ticket;
pub use work_item::{HIERARCHY_PARENT, Relation, RemoteId, RemoteWorkItem};
