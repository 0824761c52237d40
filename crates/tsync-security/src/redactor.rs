//! Sensitive-data redaction engine

use std::sync::Arc;

use regex::{NoExpand, Regex, RegexBuilder};
use thiserror::Error;
use tracing::{error, trace, warn};
use tsync_core::{Finding, FindingsByField, Ticket};

use crate::recognizer::{EntityRecognizer, NoopRecognizer};
use crate::rules::RuleRegistry;

/// Category reported for recognizer hits
pub const PERSON_NAME_CATEGORY: &str = "Full Name";

pub const DEFAULT_MARKER: &str = "[REDACTED]";

#[derive(Error, Debug)]
pub enum RedactionError {
    #[error("cannot build matcher for a {category} finding: {source}")]
    Matcher {
        category: String,
        #[source]
        source: regex::Error,
    },
}

/// Scans ticket text with the rule registry plus a name recognizer and
/// produces redacted copies.
pub struct RedactionEngine {
    registry: RuleRegistry,
    recognizer: Arc<dyn EntityRecognizer>,
    sensitive_fields: Vec<String>,
    marker: String,
}

impl RedactionEngine {
    pub fn new(registry: RuleRegistry, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self {
            registry,
            recognizer,
            sensitive_fields: vec!["description".to_string()],
            marker: DEFAULT_MARKER.to_string(),
        }
    }

    /// Fields scanned by [`scan_and_redact`](Self::scan_and_redact)
    pub fn with_sensitive_fields<S: Into<String>>(
        mut self,
        fields: impl IntoIterator<Item = S>,
    ) -> Self {
        self.sensitive_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn sensitive_fields(&self) -> &[String] {
        &self.sensitive_fields
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Findings in scan order: every rule in registry order, then names.
    ///
    /// Recognizer failures are logged and contribute no findings.
    pub fn scan(&self, text: &str) -> Vec<Finding> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut findings: Vec<Finding> = self
            .registry
            .iter()
            .flat_map(|rule| {
                rule.find_all(text)
                    .into_iter()
                    .map(move |value| Finding::new(rule.category(), value))
            })
            .collect();

        match self.recognizer.find_person_names(text) {
            Ok(names) => findings.extend(
                names
                    .into_iter()
                    .filter(|n| !n.is_empty())
                    .map(|n| Finding::new(PERSON_NAME_CATEGORY, n)),
            ),
            Err(e) => warn!(error = %e, "name recognition failed; continuing without name findings"),
        }

        findings
    }

    /// Replace every case-insensitive occurrence of each finding's literal
    /// with the marker. Findings with empty literals are ignored. Text
    /// already equal to the marker is never rewritten, so a literal such as
    /// "Ted" does not eat into "[REDACTED]".
    pub fn redact(&self, text: &str, findings: &[Finding]) -> Result<String, RedactionError> {
        let mut redacted = text.to_string();

        for finding in findings.iter().filter(|f| !f.value.is_empty()) {
            let matcher = RegexBuilder::new(&regex::escape(&finding.value))
                .case_insensitive(true)
                .build()
                .map_err(|source| RedactionError::Matcher {
                    category: finding.category.clone(),
                    source,
                })?;
            redacted = self.replace_outside_markers(&redacted, &matcher);
        }

        Ok(redacted)
    }

    fn replace_outside_markers(&self, text: &str, matcher: &Regex) -> String {
        if self.marker.is_empty() {
            return matcher.replace_all(text, NoExpand("")).into_owned();
        }

        text.split(self.marker.as_str())
            .map(|segment| matcher.replace_all(segment, NoExpand(&self.marker)))
            .collect::<Vec<_>>()
            .join(&self.marker)
    }

    /// Scan and redact the configured fields of a ticket.
    ///
    /// Returns the findings per field and a new ticket; the input is left
    /// untouched. Missing or non-text fields are skipped. A field whose
    /// redaction fails is kept as-is and the failure is logged.
    pub fn scan_and_redact(&self, ticket: &Ticket) -> (FindingsByField, Ticket) {
        let mut findings_by_field = FindingsByField::new();
        let mut redacted = ticket.clone();

        for field in &self.sensitive_fields {
            let Some(content) = ticket.text_field(field) else {
                continue;
            };

            let findings = self.scan(content);
            if findings.is_empty() {
                continue;
            }

            let categories: Vec<&str> = findings.iter().map(|f| f.category.as_str()).collect();
            warn!(
                ticket_id = %ticket.id,
                field = %field,
                count = findings.len(),
                categories = ?categories,
                "sensitive data found"
            );
            for finding in &findings {
                trace!(
                    ticket_id = %ticket.id,
                    field = %field,
                    category = %finding.category,
                    value = %finding.value,
                    "sensitive match"
                );
            }

            match self.redact(content, &findings) {
                Ok(text) => redacted = redacted.with_text_field(field, text),
                Err(e) => error!(
                    ticket_id = %ticket.id,
                    field = %field,
                    error = %e,
                    "redaction failed; field left unchanged"
                ),
            }

            findings_by_field.insert(field.clone(), findings);
        }

        (findings_by_field, redacted)
    }
}

impl Default for RedactionEngine {
    fn default() -> Self {
        Self::new(RuleRegistry::builtin(), Arc::new(NoopRecognizer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::{DictionaryRecognizer, RecognizerError};
    use serde_json::json;

    struct FailingRecognizer;

    impl EntityRecognizer for FailingRecognizer {
        fn find_person_names(&self, _text: &str) -> Result<Vec<String>, RecognizerError> {
            Err(RecognizerError::Unavailable("model not loaded".to_string()))
        }
    }

    struct EmptyNameRecognizer;

    impl EntityRecognizer for EmptyNameRecognizer {
        fn find_person_names(&self, _text: &str) -> Result<Vec<String>, RecognizerError> {
            Ok(vec![String::new()])
        }
    }

    fn engine_with_names(names: &[&str]) -> RedactionEngine {
        RedactionEngine::new(
            RuleRegistry::builtin(),
            Arc::new(DictionaryRecognizer::new(names).unwrap()),
        )
    }

    #[test]
    fn test_ssn_is_found_and_removed() {
        let engine = RedactionEngine::default();
        let text = "Caller SSN 123-45-6789 on file";

        let findings = engine.scan(text);
        assert!(findings.iter().any(|f| f.category == "SSN" && f.value == "123-45-6789"));

        let redacted = engine.redact(text, &findings).unwrap();
        assert!(redacted.contains(DEFAULT_MARKER));
        assert!(!redacted.contains("123-45-6789"));
    }

    #[test]
    fn test_scan_order_rules_then_names() {
        let engine = engine_with_names(&["John Smith"]);
        let findings = engine.scan("John Smith reported SSN 123-45-6789 from 10.1.2.3");

        let categories: Vec<&str> = findings.iter().map(|f| f.category.as_str()).collect();
        let ssn = categories.iter().position(|c| *c == "SSN").unwrap();
        let ip = categories.iter().position(|c| *c == "IP Address").unwrap();
        let name = categories.iter().position(|c| *c == PERSON_NAME_CATEGORY).unwrap();

        assert!(ssn < ip);
        assert_eq!(name, categories.len() - 1);
    }

    #[test]
    fn test_empty_text_has_no_findings() {
        assert!(RedactionEngine::default().scan("").is_empty());
    }

    #[test]
    fn test_recognizer_failure_keeps_rule_findings() {
        let engine = RedactionEngine::new(RuleRegistry::builtin(), Arc::new(FailingRecognizer));
        let findings = engine.scan("SSN 123-45-6789");

        assert!(findings.iter().any(|f| f.category == "SSN"));
        assert!(findings.iter().all(|f| f.category != PERSON_NAME_CATEGORY));
    }

    #[test]
    fn test_empty_literals_are_discarded() {
        let engine = RedactionEngine::new(RuleRegistry::empty(), Arc::new(EmptyNameRecognizer));
        assert!(engine.scan("anything").is_empty());

        let redacted = engine
            .redact("keep me", &[Finding::new("Bogus", "")])
            .unwrap();
        assert_eq!(redacted, "keep me");
    }

    #[test]
    fn test_redact_is_case_insensitive() {
        let engine = RedactionEngine::default();
        let redacted = engine
            .redact("Jane and JANE and jane", &[Finding::new("Full Name", "Jane")])
            .unwrap();
        assert_eq!(redacted, "[REDACTED] and [REDACTED] and [REDACTED]");
    }

    #[test]
    fn test_redact_escapes_special_characters() {
        let engine = RedactionEngine::default();
        let findings = vec![Finding::new("Insurance Info", "policy: (A+B)*.x")];
        let redacted = engine
            .redact("see policy: (A+B)*.x and policy: AABx", &findings)
            .unwrap();
        assert_eq!(redacted, "see [REDACTED] and policy: AABx");
    }

    #[test]
    fn test_marker_is_inserted_literally() {
        let engine = RedactionEngine::default().with_marker("$1<gone>");
        let redacted = engine
            .redact("code 123-45-6789", &[Finding::new("SSN", "123-45-6789")])
            .unwrap();
        assert_eq!(redacted, "code $1<gone>");
    }

    #[test]
    fn test_redact_is_idempotent() {
        let engine = engine_with_names(&["John Smith"]);
        let text = "User John Smith (SSN: 123-45-6789) cannot log in. DOB: 01/12/1990.";
        let findings = engine.scan(text);

        let once = engine.redact(text, &findings).unwrap();
        let twice = engine.redact(&once, &findings).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_literal_inside_marker_is_left_alone() {
        let engine = RedactionEngine::default();
        let text = "Ted called; SSN 123-45-6789";
        let findings = vec![
            Finding::new("SSN", "123-45-6789"),
            Finding::new(PERSON_NAME_CATEGORY, "Ted"),
        ];

        let once = engine.redact(text, &findings).unwrap();
        assert_eq!(once, "[REDACTED] called; SSN [REDACTED]");
        assert_eq!(engine.redact(&once, &findings).unwrap(), once);
    }

    #[test]
    fn test_non_overlapping_order_independence() {
        let engine = RedactionEngine::default();
        let text = "mail a@b.com from 10.0.0.1";
        let forward = vec![
            Finding::new("Email Address", "a@b.com"),
            Finding::new("IP Address", "10.0.0.1"),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_eq!(
            engine.redact(text, &forward).unwrap(),
            engine.redact(text, &reversed).unwrap()
        );
    }

    #[test]
    fn test_scan_and_redact_clean_ticket() {
        let engine = RedactionEngine::default();
        let ticket = Ticket::new("1", "Search broken")
            .with_description("Search returns no results even for known items.");

        let (findings, redacted) = engine.scan_and_redact(&ticket);
        assert!(findings.is_empty());
        assert_eq!(redacted, ticket);
    }

    #[test]
    fn test_scan_and_redact_only_configured_fields() {
        let engine = RedactionEngine::default();
        let ticket = Ticket::new("2", "SSN 123-45-6789 in title")
            .with_description("SSN 123-45-6789 in body");

        let (findings, redacted) = engine.scan_and_redact(&ticket);

        assert_eq!(findings.keys().collect::<Vec<_>>(), vec!["description"]);
        assert_eq!(redacted.title, ticket.title);
        assert!(!redacted.description.as_deref().unwrap().contains("123-45-6789"));
        // input untouched
        assert!(ticket.description.as_deref().unwrap().contains("123-45-6789"));
    }

    #[test]
    fn test_scan_and_redact_skips_missing_and_non_text_fields() {
        let engine = RedactionEngine::default().with_sensitive_fields([
            "description",
            "notes",
            "status",
            "title",
        ]);
        let ticket = Ticket::new("3", "Call from 10.0.0.1")
            .with_extra("status", json!(42))
            .with_extra("notes", json!("Billing amount 400"));

        let (findings, redacted) = engine.scan_and_redact(&ticket);

        assert!(!findings.contains_key("description"));
        assert!(!findings.contains_key("status"));
        assert!(findings.contains_key("notes"));
        assert!(findings.contains_key("title"));
        assert_eq!(redacted.extra["status"], json!(42));
        assert_eq!(redacted.text_field("notes"), Some("[REDACTED]"));
    }
}
