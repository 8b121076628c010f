//! Error types shared by the core crate and the CLI client.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while loading an expansions file.
#[derive(Debug, Error)]
pub enum ExpansionsError {
    #[error("failed to read expansions file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse expansions YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid expansions: field `{field}` {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Failure while talking to the Evergreen API.
#[derive(Debug, Clone, Error)]
pub enum EvergreenError {
    #[error("HTTP error {status} from {url}: {message}")]
    Http {
        status: u16,
        url: String,
        message: String,
    },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl EvergreenError {
    /// Whether the same request may succeed if issued again.
    pub fn is_transient(&self) -> bool {
        match self {
            EvergreenError::Http { status, .. } => *status == 429 || *status >= 500,
            EvergreenError::Transport { .. } => true,
            EvergreenError::Decode { .. } | EvergreenError::Config(_) => false,
        }
    }
}
