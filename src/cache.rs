//! Last-applied IP cache file.

use crate::error::{DdnsError, Result};
use std::io::ErrorKind;
use std::path::PathBuf;

/// Plain-text file holding the IP last written to every configured record.
///
/// A missing or empty file reads as "no cached IP". Writes truncate and
/// replace the whole file; a torn write just looks stale on the next run.
#[derive(Debug, Clone)]
pub struct IpCache {
    path: PathBuf,
}

impl IpCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the cached IP, trimmed.
    pub fn load(&self) -> Result<Option<String>> {
        tracing::debug!("Loading cached IP from {}", self.path.display());

        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let ip = content.trim();
                Ok((!ip.is_empty()).then(|| ip.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(DdnsError::Cache {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Overwrite the cache with `ip`.
    pub fn save(&self, ip: &str) -> Result<()> {
        tracing::debug!("Saving current IP {} to cache file {}", ip, self.path.display());

        std::fs::write(&self.path, ip).map_err(|source| DdnsError::Cache {
            path: self.path.clone(),
            source,
        })
    }
}
