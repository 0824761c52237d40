//! Error types for tsync-sources

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SourceError>;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] tsync_core::CoreError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
