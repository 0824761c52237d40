//! Person-name recognition capability
//!
//! The redaction engine only needs "which substrings are personal names".
//! Anything that answers that (a local model, a remote service, a fixed
//! dictionary) can sit behind [`EntityRecognizer`].

use regex::{Regex, RegexBuilder};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecognizerError {
    #[error("recognizer unavailable: {0}")]
    Unavailable(String),

    #[error("input too large: {len} bytes (limit {limit})")]
    InputTooLarge { len: usize, limit: usize },
}

pub trait EntityRecognizer: Send + Sync {
    /// Substrings of `text` classified as personal names, in text order
    fn find_person_names(&self, text: &str) -> Result<Vec<String>, RecognizerError>;
}

/// Recognizer that never reports anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecognizer;

impl EntityRecognizer for NoopRecognizer {
    fn find_person_names(&self, _text: &str) -> Result<Vec<String>, RecognizerError> {
        Ok(Vec::new())
    }
}

/// Matches a configured list of known names, case-insensitively, on word
/// boundaries. Reports each name as it is spelled in the scanned text.
#[derive(Debug, Clone)]
pub struct DictionaryRecognizer {
    matcher: Option<Regex>,
    max_input_len: usize,
}

impl DictionaryRecognizer {
    pub const DEFAULT_MAX_INPUT_LEN: usize = 1_000_000;

    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Self, RecognizerError> {
        let mut names: Vec<&str> = names
            .iter()
            .map(|n| n.as_ref().trim())
            .filter(|n| !n.is_empty())
            .collect();
        // Alternation is leftmost-first: longest names go first so
        // "Jane Doe" wins over "Jane".
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        names.dedup();

        let matcher = if names.is_empty() {
            None
        } else {
            let alternation = names
                .iter()
                .map(|n| regex::escape(n))
                .collect::<Vec<_>>()
                .join("|");
            let regex = RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
                .case_insensitive(true)
                .build()
                .map_err(|e| RecognizerError::Unavailable(e.to_string()))?;
            Some(regex)
        };

        Ok(Self {
            matcher,
            max_input_len: Self::DEFAULT_MAX_INPUT_LEN,
        })
    }

    pub fn with_max_input_len(mut self, max_input_len: usize) -> Self {
        self.max_input_len = max_input_len;
        self
    }
}

impl EntityRecognizer for DictionaryRecognizer {
    fn find_person_names(&self, text: &str) -> Result<Vec<String>, RecognizerError> {
        if text.len() > self.max_input_len {
            return Err(RecognizerError::InputTooLarge {
                len: text.len(),
                limit: self.max_input_len,
            });
        }

        Ok(self
            .matcher
            .as_ref()
            .map(|m| m.find_iter(text).map(|n| n.as_str().to_string()).collect())
            .unwrap_or_default())
    }
}
