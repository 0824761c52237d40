use std::io::Read;

use anyhow::Result;
use tsync_config::Config;

use super::build_redactor;

pub fn handle(config: &Config, text: Option<String>, show_values: bool) -> Result<()> {
    let text = match text.as_deref() {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
        Some(text) => text.to_string(),
    };

    let redactor = build_redactor(config)?;
    let findings = redactor.scan(&text);

    if findings.is_empty() {
        println!("No sensitive data found.");
        return Ok(());
    }

    println!("Findings ({}):", findings.len());
    for finding in &findings {
        if show_values {
            println!("  {}: {}", finding.category, finding.value);
        } else {
            println!("  {} ({} chars)", finding.category, finding.value.chars().count());
        }
    }

    println!("\nRedacted:");
    println!("{}", redactor.redact(&text, &findings)?);

    Ok(())
}
