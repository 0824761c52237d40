use anyhow::Result;
use tsync_config::Config;

use super::build_redactor;

pub fn handle(config: &Config) -> Result<()> {
    let redactor = build_redactor(config)?;
    let registry = redactor.registry();

    println!("Redaction categories ({}), in scan order:", registry.len());
    for rule in registry.iter() {
        let flags = if rule.is_case_insensitive() { " [i]" } else { "" };
        println!("  {}{}", rule.category(), flags);
        println!("    {}", rule.pattern());
    }

    if !config.redaction.known_names.is_empty() {
        println!(
            "  Full Name (known names: {})",
            config.redaction.known_names.len()
        );
    }
    if !config.redaction.disabled_categories.is_empty() {
        println!("\nDisabled: {}", config.redaction.disabled_categories.join(", "));
    }

    Ok(())
}
