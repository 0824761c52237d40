//! Ticket domain model

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A helpdesk ticket as read from the source system.
///
/// Tickets are inputs to one reconciliation pass. Redaction produces a new
/// value through [`Ticket::with_text_field`] instead of editing in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Stable source-system identifier
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    /// Work-tracker id of the parent item, when the ticket belongs under one
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Creation time, epoch milliseconds
    #[serde(default)]
    pub insert_time: i64,
    /// Last-modified time, epoch milliseconds
    #[serde(default)]
    pub update_time: i64,
    /// Any other source fields (status, notes, custom fields)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Ticket {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            priority: None,
            parent_id: None,
            insert_time: 0,
            update_time: 0,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_times(mut self, insert_time: i64, update_time: i64) -> Self {
        self.insert_time = insert_time;
        self.update_time = update_time;
        self
    }

    pub fn with_extra(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// Text content of a named field.
    ///
    /// Returns `None` when the field is absent or not text-typed.
    pub fn text_field(&self, name: &str) -> Option<&str> {
        match name {
            "title" => Some(self.title.as_str()),
            "description" => self.description.as_deref(),
            "priority" => self.priority.as_deref(),
            "parent_id" => self.parent_id.as_deref(),
            "id" | "insert_time" | "update_time" => None,
            other => self.extra.get(other).and_then(Value::as_str),
        }
    }

    /// Copy of this ticket with one text field replaced.
    ///
    /// Identity and timestamp fields are never rewritten.
    pub fn with_text_field(&self, name: &str, value: String) -> Self {
        let mut next = self.clone();
        match name {
            "title" => next.title = value,
            "description" => next.description = Some(value),
            "priority" => next.priority = Some(value),
            "parent_id" => next.parent_id = Some(value),
            "id" | "insert_time" | "update_time" => {}
            other => {
                next.extra.insert(other.to_string(), Value::String(value));
            }
        }
        next
    }
}
