//! Per-ticket sync outcomes and the run summary

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::RemoteId;

/// Terminal result of reconciling one ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SyncOutcome {
    Created { remote_id: RemoteId },
    Updated { remote_id: RemoteId },
    Skipped { reason: String },
    Failed { error: String },
}

impl SyncOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        SyncOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(error: impl fmt::Display) -> Self {
        SyncOutcome::Failed {
            error: error.to_string(),
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            SyncOutcome::Created { .. } => "created",
            SyncOutcome::Updated { .. } => "updated",
            SyncOutcome::Skipped { .. } => "skipped",
            SyncOutcome::Failed { .. } => "failed",
        }
    }

    pub fn remote_id(&self) -> Option<RemoteId> {
        match self {
            SyncOutcome::Created { remote_id } | SyncOutcome::Updated { remote_id } => {
                Some(*remote_id)
            }
            _ => None,
        }
    }
}

/// Run-level counters, reported at the end of a run and never persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &SyncOutcome) {
        self.total += 1;
        match outcome {
            SyncOutcome::Created { .. } => self.created += 1,
            SyncOutcome::Updated { .. } => self.updated += 1,
            SyncOutcome::Skipped { .. } => self.skipped += 1,
            SyncOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a SyncOutcome>) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            summary.record(outcome);
        }
        summary
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} skipped, {} failed ({} total)",
            self.created, self.updated, self.skipped, self.failed, self.total
        )
    }
}
