//! Configuration loading for porkbun-ddns.

use crate::error::{DdnsError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Registrar API base URL used when the config omits `endpoint`.
pub const DEFAULT_ENDPOINT: &str = "https://api-ipv4.porkbun.com/api/json/v3";

/// IP echo service used when the config omits `ip_service`.
pub const DEFAULT_IP_SERVICE: &str = "https://ifconfig.me/all.json";

/// Record name denoting the zone apex.
pub const APEX: &str = "@";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Registrar API base URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API key (or environment variable name if prefixed with $).
    pub apikey: String,

    /// Secret API key (or environment variable name if prefixed with $).
    pub secretapikey: String,

    /// Domain whose records are managed, e.g. "example.com".
    pub domain: String,

    /// Records to keep pointed at the current IP, in update order.
    pub records: Vec<RecordSpec>,

    /// IP echo service returning JSON with an `ip_addr` field.
    #[serde(default = "default_ip_service")]
    pub ip_service: String,

    /// How existing records are brought up to date.
    #[serde(default)]
    pub update_strategy: UpdateStrategy,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_ip_service() -> String {
    DEFAULT_IP_SERVICE.to_string()
}

/// A configured record, by subdomain label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSpec {
    /// Subdomain label, or "@" for the bare domain.
    pub name: String,
}

impl RecordSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn is_apex(&self) -> bool {
        self.name == APEX
    }

    /// Fully-qualified name as the registrar reports it.
    pub fn fqdn(&self, domain: &str) -> String {
        if self.is_apex() {
            domain.to_string()
        } else {
            format!("{}.{}", self.name, domain)
        }
    }

    /// Name sent on create/edit; the registrar expects an empty name for the apex.
    pub fn subdomain(&self) -> &str {
        if self.is_apex() {
            ""
        } else {
            &self.name
        }
    }
}

/// Strategy for replacing a record's content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStrategy {
    /// Delete every matching record, then create a fresh A record.
    #[default]
    Recreate,
    /// Edit a lone existing A record in place, falling back to recreate.
    Edit,
}

/// Credentials and base URL passed to every registrar call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub endpoint: String,
    pub apikey: String,
    pub secretapikey: String,
}

impl Config {
    /// Load configuration from a specific path.
    ///
    /// `.toml` files are parsed as TOML; anything else as JSON.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DdnsError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let config = if is_toml {
            Self::from_toml(&content)?
        } else {
            Self::from_json(&content)?
        };

        tracing::debug!(
            "Loaded config from {}: domain {}, {} record(s)",
            path.display(),
            config.domain,
            config.records.len()
        );
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content)?;
        config.finish()
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.finish()
    }

    fn finish(mut self) -> Result<Self> {
        self.apikey = resolve_env(&self.apikey)?;
        self.secretapikey = resolve_env(&self.secretapikey)?;
        self.endpoint = self.endpoint.trim_end_matches('/').to_string();
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.domain.trim().is_empty() {
            return Err(DdnsError::Config("domain must not be empty".to_string()));
        }
        if self.apikey.is_empty() || self.secretapikey.is_empty() {
            return Err(DdnsError::Config(
                "apikey and secretapikey must not be empty".to_string(),
            ));
        }
        if let Some(pos) = self.records.iter().position(|r| r.name.trim().is_empty()) {
            return Err(DdnsError::Config(format!(
                "records[{pos}].name must not be empty (use \"@\" for the bare domain)"
            )));
        }
        if self.records.is_empty() {
            tracing::warn!("No records configured; nothing will be updated");
        }
        Ok(())
    }

    pub fn api(&self) -> ApiConfig {
        ApiConfig {
            endpoint: self.endpoint.clone(),
            apikey: self.apikey.clone(),
            secretapikey: self.secretapikey.clone(),
        }
    }

    /// Example configuration, rendered into the CLI help.
    pub fn example() -> Self {
        Self {
            endpoint: default_endpoint(),
            apikey: "pk1_key".to_string(),
            secretapikey: "sk1_key".to_string(),
            domain: "example.com".to_string(),
            records: vec![
                RecordSpec::new("www"),
                RecordSpec::new("home"),
                RecordSpec::new(APEX),
            ],
            ip_service: default_ip_service(),
            update_strategy: UpdateStrategy::Recreate,
        }
    }
}

/// Resolve environment variable references (values starting with $).
fn resolve_env(value: &str) -> Result<String> {
    match value.strip_prefix('$') {
        Some(var_name) => std::env::var(var_name).map_err(|_| {
            DdnsError::Config(format!("Environment variable {var_name} not set"))
        }),
        None => Ok(value.to_string()),
    }
}
