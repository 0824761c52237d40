//! Declarative registry of sensitive-data rules
//!
//! Each category is one row in [`BUILTIN_RULES`]. Scan logic iterates the
//! table; adding, disabling or reordering a category never touches it.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("invalid pattern for category '{category}': {source}")]
    InvalidPattern {
        category: String,
        #[source]
        source: regex::Error,
    },

    #[error("category already registered: {0}")]
    DuplicateCategory(String),
}

/// Static description of a rule before compilation
#[derive(Debug, Clone, Copy)]
pub struct RuleSpec {
    pub category: &'static str,
    pub pattern: &'static str,
    /// Keyword-anchored rules match case-insensitively
    pub case_insensitive: bool,
}

const fn structural(category: &'static str, pattern: &'static str) -> RuleSpec {
    RuleSpec {
        category,
        pattern,
        case_insensitive: false,
    }
}

const fn keyword(category: &'static str, pattern: &'static str) -> RuleSpec {
    RuleSpec {
        category,
        pattern,
        case_insensitive: true,
    }
}

/// Built-in categories in scan order (PII first, then PHI)
pub const BUILTIN_RULES: &[RuleSpec] = &[
    // PII
    structural("Address", r"\d{1,5}\s\w+\s\w+"),
    structural("Phone Number", r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}"),
    structural("Email Address", r"\b[\w.-]+?@\w+?\.\w+?\b"),
    structural("SSN", r"\b\d{3}-\d{2}-\d{4}\b"),
    structural("Driver's License", r"[A-Z]{1,2}\d{6,9}"),
    structural("Passport", r"\b\d{9}\b"),
    structural("Date of Birth", r"\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b"),
    structural("IP Address", r"\b\d{1,3}(?:\.\d{1,3}){3}\b"),
    keyword("Login Credentials", r"(username|login|password)\s*[:=]\s*\S+"),
    // PHI
    keyword("Medical Records", r"\bMRN\d{6,}\b"),
    keyword("Insurance Info", r"(insurance|policy)\s*[:=]?\s*\S+"),
    keyword("Prescription", r"\b(?:rx|prescription)\s*[:=]?\s*\S+"),
    keyword("Billing Info", r"billing\s*(code|info|amount)?[:=]?\s*\S+"),
    keyword("Member ID", r"\bMID[\s:_-]?\d+[A-Z]?\b"),
    keyword("Patient ID", r"\bPAT[\s:_-]?ID[\s:_-]?\w+\b"),
    keyword("Patient Account Number", r"\b(?:Account|Acct)[\s:_-]*#?\s*\d{6,}\b"),
    keyword("Medical Record Code", r"\b(?:MRC|MedRec)[\s:_-]?\d{6,}\b"),
    keyword("Encounter Number", r"\b(?:encounter|enc#)[\s:_-]?\d{5,}\b"),
    keyword("Treatment ID", r"\bTREAT[\s:_-]?\d{5,}\b"),
    keyword("Insurance Group Number", r"\bgroup\s*(number|#)?[:=]?\s*\d{5,}\b"),
    keyword(
        "ICD Code",
        r"\b(ICD(?:-10)?|Diagnosis)\s*(code)?[:=]?\s*[A-Z]\d{2}(?:\.\d{1,4})?\b",
    ),
    keyword("NPI Number", r"\bNPI[\s:_-]?\d{10}\b"),
    keyword("Patient Portal ID", r"\bportal\s*(id|user)?[:=]?\s*\w{6,}\b"),
    keyword("Referral Code", r"\breferral\s*(code|id)?[:=]?\s*\w{5,}\b"),
    keyword(
        "Clinical Trial ID",
        r"\b(?:NCT|Trial|Study)[\s:_-]?(?:ID)?[:=]?\s*\w{5,}\b",
    ),
    keyword("Allergy Code", r"\ballergy\s*(code|id)?[:=]?\s*\w{4,}\b"),
    keyword("Vaccination Record ID", r"\bvaccination\s*(id|record)?[:=]?\s*\w{5,}\b"),
    keyword(
        "Lab Order Number",
        r"\b(lab\s*(order|result)?\s*(no|number)?[:=]?\s*\w{5,})\b",
    ),
    keyword("Test Result Code", r"\b(test|result)\s*(code|id)?[:=]?\s*[A-Z0-9]{4,}\b"),
    keyword("Specimen ID", r"\b(specimen|sample)\s*(id)?[:=]?\s*\w{4,}\b"),
    keyword("Hospital Unit Number", r"\bunit\s*(no|number)?[:=]?\s*\w{3,}\b"),
    keyword("Care Plan ID", r"\bcare\s*plan\s*(id|number)?[:=]?\s*\w{3,}\b"),
    keyword(
        "Discharge Summary Code",
        r"\bdischarge\s*(summary|note)?\s*(id|code)?[:=]?\s*\w{5,}\b",
    ),
    keyword("Inpatient Visit ID", r"\bvisit\s*(id|code)?[:=]?\s*\w{5,}\b"),
];

lazy_static! {
    static ref COMPILED_BUILTINS: Vec<Rule> = BUILTIN_RULES
        .iter()
        .map(|spec| {
            Rule::compile(spec.category, spec.pattern, spec.case_insensitive)
                .unwrap_or_else(|e| panic!("built-in rule table is invalid: {e}"))
        })
        .collect();
}

/// A compiled category matcher
#[derive(Debug, Clone)]
pub struct Rule {
    category: String,
    regex: Regex,
    case_insensitive: bool,
}

impl Rule {
    pub fn compile(
        category: impl Into<String>,
        pattern: &str,
        case_insensitive: bool,
    ) -> Result<Self, RuleError> {
        let category = category.into();
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|source| RuleError::InvalidPattern {
                category: category.clone(),
                source,
            })?;

        Ok(Self {
            category,
            regex,
            case_insensitive,
        })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Every non-overlapping whole match, in text order
    pub fn find_all(&self, text: &str) -> Vec<String> {
        self.regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Ordered mapping from category label to matcher. Immutable once built.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
}

impl RuleRegistry {
    /// Registry with every built-in category
    pub fn builtin() -> Self {
        Self {
            rules: COMPILED_BUILTINS.clone(),
        }
    }

    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Drop the named categories. Unknown labels are ignored.
    pub fn without<S: AsRef<str>>(mut self, categories: &[S]) -> Self {
        self.rules
            .retain(|r| !categories.iter().any(|c| c.as_ref() == r.category));
        self
    }

    /// Append a rule after every existing one
    pub fn with_rule(mut self, rule: Rule) -> Result<Self, RuleError> {
        if self.get(rule.category()).is_some() {
            return Err(RuleError::DuplicateCategory(rule.category));
        }
        self.rules.push(rule);
        Ok(self)
    }

    pub fn get(&self, category: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.category == category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.category.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Literal matches of one category. Unknown categories match nothing.
    pub fn match_category(&self, category: &str, text: &str) -> Vec<String> {
        self.get(category)
            .map(|rule| rule.find_all(text))
            .unwrap_or_default()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_compiles_in_order() {
        let registry = RuleRegistry::builtin();
        assert_eq!(registry.len(), BUILTIN_RULES.len());

        let first: Vec<_> = registry.categories().take(4).collect();
        assert_eq!(first, vec!["Address", "Phone Number", "Email Address", "SSN"]);
    }

    #[test]
    fn test_ssn_match() {
        let registry = RuleRegistry::builtin();
        let matches = registry.match_category("SSN", "SSN: 123-45-6789 on file");
        assert_eq!(matches, vec!["123-45-6789"]);
    }

    #[test]
    fn test_keyword_rules_ignore_case() {
        let registry = RuleRegistry::builtin();
        assert_eq!(
            registry.match_category("Billing Info", "BILLING amount: 400"),
            vec!["BILLING amount: 400"]
        );
        assert_eq!(
            registry.match_category("Login Credentials", "Password=hunter2 sent"),
            vec!["Password=hunter2"]
        );
    }

    #[test]
    fn test_structural_rules_respect_case() {
        let registry = RuleRegistry::builtin();
        assert_eq!(
            registry.match_category("Driver's License", "license D1234567"),
            vec!["D1234567"]
        );
        assert!(registry.match_category("Driver's License", "license d1234567").is_empty());
    }

    #[test]
    fn test_multiple_matches_per_category() {
        let registry = RuleRegistry::builtin();
        let matches = registry.match_category("IP Address", "from 10.0.0.1 to 192.168.1.20");
        assert_eq!(matches, vec!["10.0.0.1", "192.168.1.20"]);
    }

    #[test]
    fn test_whole_match_reported_for_grouped_rules() {
        let registry = RuleRegistry::builtin();
        let matches = registry.match_category("ICD Code", "diagnosis code: E11.9 noted");
        assert_eq!(matches, vec!["diagnosis code: E11.9"]);
    }

    #[test]
    fn test_without_and_custom_rules() {
        let registry = RuleRegistry::builtin()
            .without(&["Address", "Passport"])
            .with_rule(Rule::compile("Employee ID", r"EMP-\d{6}", false).unwrap())
            .unwrap();

        assert!(registry.get("Address").is_none());
        assert!(registry.get("Passport").is_none());
        assert_eq!(registry.categories().last(), Some("Employee ID"));
        assert_eq!(registry.match_category("Employee ID", "ask EMP-123456"), vec!["EMP-123456"]);
    }

    #[test]
    fn test_duplicate_and_invalid_rules_rejected() {
        let dup = RuleRegistry::builtin().with_rule(Rule::compile("SSN", r"\d+", false).unwrap());
        assert!(matches!(dup, Err(RuleError::DuplicateCategory(_))));

        let invalid = Rule::compile("Broken", r"(unclosed", false);
        assert!(matches!(invalid, Err(RuleError::InvalidPattern { .. })));
    }

    #[test]
    fn test_unknown_category_matches_nothing() {
        let registry = RuleRegistry::builtin();
        assert!(registry.match_category("Nope", "123-45-6789").is_empty());
    }
}
