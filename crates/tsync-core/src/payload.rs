//! Transport-neutral work-item payload
//!
//! The engine decides what goes into a payload; the tracker client decides
//! how it is encoded on the wire.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentLink {
    /// Work-tracker id of the parent item
    pub parent_id: String,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePayload {
    pub title: String,
    pub description: Option<String>,
    pub priority: u8,
    /// Only sent on create; the reference is immutable once set
    pub external_id: Option<String>,
    pub parent: Option<ParentLink>,
}
