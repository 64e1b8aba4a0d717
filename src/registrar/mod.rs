//! Registrar API client.

mod porkbun;


pub use porkbun::PorkbunClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::net::Ipv4Addr;

/// TTL in seconds for every record this tool writes.
pub const RECORD_TTL: u32 = 300;

/// DNS record type as reported by the registrar.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum RecordType {
    A,
    Alias,
    Cname,
    Other(String),
}

impl RecordType {
    /// Types that occupy the name an A record would, and so get replaced.
    pub fn is_replaceable(&self) -> bool {
        matches!(self, RecordType::A | RecordType::Alias | RecordType::Cname)
    }
}

impl From<String> for RecordType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "A" => RecordType::A,
            "ALIAS" => RecordType::Alias,
            "CNAME" => RecordType::Cname,
            _ => RecordType::Other(s),
        }
    }
}

impl From<&str> for RecordType {
    fn from(s: &str) -> Self {
        RecordType::from(s.to_string())
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::A => f.write_str("A"),
            RecordType::Alias => f.write_str("ALIAS"),
            RecordType::Cname => f.write_str("CNAME"),
            RecordType::Other(s) => f.write_str(s),
        }
    }
}

/// A record owned by the registrar.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DnsRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub content: String,
    #[serde(default, deserialize_with = "ttl")]
    pub ttl: u32,
}

/// Registrar's answer to a create or edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateResult {
    pub status: String,
    /// Id of the created record, when the registrar returns one.
    pub id: Option<String>,
}

/// Record-management operations used by the reconciler.
///
/// Every call is a single request; failures are returned, never retried.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Registrar: Send + Sync {
    /// List every record in `domain`.
    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>>;

    /// Delete a record by id.
    async fn delete_record(&self, domain: &str, id: &str) -> Result<()>;

    /// Create an A record for `subdomain` (empty for the apex).
    async fn create_record(&self, domain: &str, subdomain: &str, ip: Ipv4Addr)
        -> Result<CreateResult>;

    /// Rewrite an existing record in place as an A record pointing at `ip`.
    async fn edit_record(
        &self,
        domain: &str,
        id: &str,
        subdomain: &str,
        ip: Ipv4Addr,
    ) -> Result<CreateResult>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl From<StringOrNumber> for String {
    fn from(v: StringOrNumber) -> Self {
        match v {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

/// The registrar sends ids as strings in listings but as numbers on create.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn ttl<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = string_or_number(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}
