//! Sensitive-data findings

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One detected instance of sensitive content.
///
/// `Debug` prints the category and the length of the match, never the
/// matched text, so findings can be logged with `{:?}` without leaking.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub category: String,
    pub value: String,
}

impl Finding {
    pub fn new(category: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            value: value.into(),
        }
    }
}

impl fmt::Debug for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Finding")
            .field("category", &self.category)
            .field("value", &format_args!("<{} chars>", self.value.chars().count()))
            .finish()
    }
}

/// Findings per ticket field, each list in scan order
pub type FindingsByField = BTreeMap<String, Vec<Finding>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_value() {
        let finding = Finding::new("SSN", "123-45-6789");
        let rendered = format!("{:?}", finding);

        assert!(rendered.contains("SSN"));
        assert!(rendered.contains("<11 chars>"));
        assert!(!rendered.contains("123-45-6789"));
    }
}
