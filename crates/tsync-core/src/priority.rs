//! Helpdesk priority labels and their work-tracker values

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Parse a source label. Labels match exactly; anything else,
    /// including a missing label, is Medium.
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some("High") => Priority::High,
            Some("Low") => Priority::Low,
            _ => Priority::Medium,
        }
    }

    /// Numeric work-tracker priority (1 = highest)
    pub fn value(self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

/// Map a source priority label to the work-tracker's numeric priority.
pub fn map_priority(label: Option<&str>) -> u8 {
    Priority::from_label(label).value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        assert_eq!(map_priority(Some("High")), 1);
        assert_eq!(map_priority(Some("Medium")), 2);
        assert_eq!(map_priority(Some("Low")), 3);
    }

    #[test]
    fn test_unrecognized_defaults_to_medium() {
        for label in [
            Some(""),
            Some("Unknown"),
            Some("urgent!!"),
            Some("high"),
            Some(" Low "),
            Some("LOW"),
            None,
        ] {
            assert_eq!(map_priority(label), 2, "label {:?}", label);
        }
    }

    #[test]
    fn test_total_over_sample_inputs() {
        let inputs = [Some("High"), Some("Medium"), Some("Low"), Some(""), None, Some("Unknown")];
        assert!(inputs.iter().all(|l| (1..=3).contains(&map_priority(*l))));
    }
}
