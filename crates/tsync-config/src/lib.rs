use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const HELPDESK_TOKEN_ENV: &str = "TSYNC_HELPDESK_TOKEN";
pub const TRACKER_PAT_ENV: &str = "TSYNC_TRACKER_PAT";

/// Configuration for tsync
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub helpdesk: HelpdeskConfig,

    #[serde(default)]
    pub tracker: TrackerConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub redaction: RedactionConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpdeskConfig {
    /// e.g. https://yourcompany.sysaidit.com
    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub api_token: String,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_checkpoint_file")]
    pub checkpoint_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub organization: String,

    #[serde(default)]
    pub project: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default)]
    pub personal_access_token: String,

    /// Work-item field holding the helpdesk ticket id
    #[serde(default = "default_external_id_field")]
    pub external_id_field: String,

    #[serde(default = "default_work_item_type")]
    pub work_item_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Tickets reconciled at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per remote call
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_sensitive_fields")]
    pub sensitive_fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionConfig {
    #[serde(default = "default_marker")]
    pub marker: String,

    #[serde(default)]
    pub disabled_categories: Vec<String>,

    #[serde(default)]
    pub custom_rules: Vec<CustomRule>,

    /// Names reported by the dictionary recognizer
    #[serde(default)]
    pub known_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRule {
    pub category: String,
    pub pattern: String,
    #[serde(default)]
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for HelpdeskConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: String::new(),
            page_size: default_page_size(),
            checkpoint_file: default_checkpoint_file(),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            organization: String::new(),
            project: String::new(),
            api_version: default_api_version(),
            personal_access_token: String::new(),
            external_id_field: default_external_id_field(),
            work_item_type: default_work_item_type(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            request_timeout_secs: default_timeout_secs(),
            sensitive_fields: default_sensitive_fields(),
        }
    }
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            disabled_categories: Vec::new(),
            custom_rules: Vec::new(),
            known_names: Vec::new(),
        }
    }
}

fn default_page_size() -> u32 {
    100
}

fn default_checkpoint_file() -> PathBuf {
    PathBuf::from("state/last_sync.json")
}

fn default_api_version() -> String {
    "7.1".to_string()
}

fn default_external_id_field() -> String {
    "Custom.SysAidID".to_string()
}

fn default_work_item_type() -> String {
    "Bug".to_string()
}

fn default_concurrency() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_sensitive_fields() -> Vec<String> {
    vec!["description".to_string()]
}

fn default_marker() -> String {
    "[REDACTED]".to_string()
}

impl SyncConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

impl Config {
    /// Load config from the given path, or the default location.
    ///
    /// A missing default config file is created with default values.
    /// Secrets from the environment override file values.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load_or_create(&Self::config_path())?,
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a config file
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    fn load_or_create(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Write config as TOML, creating parent directories
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override secrets from a variable lookup (the process environment in
    /// [`Config::load`]). Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup(HELPDESK_TOKEN_ENV).filter(|v| !v.is_empty()) {
            self.helpdesk.api_token = token;
        }
        if let Some(pat) = lookup(TRACKER_PAT_ENV).filter(|v| !v.is_empty()) {
            self.tracker.personal_access_token = pat;
        }
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "tsync", "tsync") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.tsync/config.toml")
        }
    }
}
