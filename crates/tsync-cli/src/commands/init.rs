use std::path::Path;

use anyhow::Result;
use tsync_config::{Config, HELPDESK_TOKEN_ENV, TRACKER_PAT_ENV};

pub fn handle(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::config_path);
    write_default(&path, force)?;

    println!("✓ Created {}", path.display());
    println!("  Fill in [helpdesk] base_url and [tracker] organization/project");
    println!(
        "  Secrets can come from {} and {}",
        HELPDESK_TOKEN_ENV, TRACKER_PAT_ENV
    );
    Ok(())
}

fn write_default(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::default().save(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_default_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tsync").join("config.toml");

        write_default(&path, false).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.sync.concurrency, 4);

        assert!(write_default(&path, false).is_err());
        write_default(&path, true).unwrap();
    }
}
