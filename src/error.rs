//! Error types for porkbun-ddns.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for porkbun-ddns.
pub type Result<T> = std::result::Result<T, DdnsError>;

/// DDNS error types.
///
/// Every variant is fatal for a run; none are retried.
#[derive(Error, Debug)]
pub enum DdnsError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Public IP lookup error.
    #[error("IP resolution failed: {0}")]
    IpResolution(String),

    /// Registrar API error.
    #[error("Registrar {operation} failed{}: {message}", fmt_status(.status))]
    Registrar {
        operation: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// Cache file error (absence is not an error).
    #[error("Cache file {}: {source}", .path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl DdnsError {
    pub(crate) fn registrar(operation: &'static str, message: impl Into<String>) -> Self {
        DdnsError::Registrar {
            operation,
            status: None,
            message: message.into(),
        }
    }
}

impl From<toml::de::Error> for DdnsError {
    fn from(e: toml::de::Error) -> Self {
        DdnsError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for DdnsError {
    fn from(e: serde_json::Error) -> Self {
        DdnsError::Config(e.to_string())
    }
}
