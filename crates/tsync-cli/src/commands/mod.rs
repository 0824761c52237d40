pub mod init;
pub mod rules;
pub mod scan;
pub mod sync;

use std::sync::Arc;

use anyhow::Result;
use tsync_config::Config;
use tsync_security::{
    DictionaryRecognizer, EntityRecognizer, NoopRecognizer, RedactionEngine, Rule, RuleRegistry,
};

/// Redaction engine as configured: built-ins minus disabled categories,
/// then custom rules, then the known-names recognizer.
pub fn build_redactor(config: &Config) -> Result<RedactionEngine> {
    let redaction = &config.redaction;

    let mut registry = RuleRegistry::builtin().without(&redaction.disabled_categories);
    for custom in &redaction.custom_rules {
        let rule = Rule::compile(custom.category.as_str(), &custom.pattern, custom.case_insensitive)?;
        registry = registry.with_rule(rule)?;
    }

    let recognizer: Arc<dyn EntityRecognizer> = if redaction.known_names.is_empty() {
        Arc::new(NoopRecognizer)
    } else {
        Arc::new(DictionaryRecognizer::new(&redaction.known_names)?)
    };

    Ok(RedactionEngine::new(registry, recognizer)
        .with_sensitive_fields(config.sync.sensitive_fields.iter().cloned())
        .with_marker(redaction.marker.as_str()))
}
