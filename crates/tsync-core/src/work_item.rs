//! Work-tracker item model

use std::fmt;

use serde::{Deserialize, Serialize};

/// Relation type of a child → parent hierarchy link
pub const HIERARCHY_PARENT: &str = "System.LinkTypes.Hierarchy-Reverse";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(pub u64);

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RemoteId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub rel: String,
    pub url: String,
}

/// A work item as currently stored by the tracker.
///
/// Only held for the duration of one reconciliation decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteWorkItem {
    pub id: RemoteId,
    /// Epoch milliseconds
    pub last_modified: i64,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl RemoteWorkItem {
    pub fn has_link(&self, rel: &str, url: &str) -> bool {
        self.relations.iter().any(|r| r.rel == rel && r.url == url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_link() {
        let item = RemoteWorkItem {
            id: RemoteId(1),
            last_modified: 0,
            relations: vec![Relation {
                rel: HIERARCHY_PARENT.to_string(),
                url: "https://tracker/_apis/wit/workItems/7".to_string(),
            }],
        };

        assert!(item.has_link(HIERARCHY_PARENT, "https://tracker/_apis/wit/workItems/7"));
        assert!(!item.has_link(HIERARCHY_PARENT, "https://tracker/_apis/wit/workItems/8"));
        assert!(!item.has_link("System.LinkTypes.Related", "https://tracker/_apis/wit/workItems/7"));
    }
}
