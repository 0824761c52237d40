//! PII/PHI detection and redaction for tsync
//!
//! - [`RuleRegistry`]: declarative table of category matchers
//! - [`EntityRecognizer`]: pluggable person-name detection
//! - [`RedactionEngine`]: scan, redact, and ticket-level scan-and-redact

pub mod recognizer;
pub mod redactor;
pub mod rules;

pub use recognizer::{DictionaryRecognizer, EntityRecognizer, NoopRecognizer, RecognizerError};
pub use redactor::{DEFAULT_MARKER, PERSON_NAME_CATEGORY, RedactionEngine, RedactionError};
pub use rules::{BUILTIN_RULES, Rule, RuleError, RuleRegistry, RuleSpec};
