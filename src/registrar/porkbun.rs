//! Porkbun JSON API client.

use super::{string_or_number, CreateResult, DnsRecord, Registrar, RECORD_TTL};
use crate::config::ApiConfig;
use crate::error::{DdnsError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(30);
const STATUS_ERROR: &str = "ERROR";
const RETRIEVE_HINT: &str =
    " (check that the domain is correct and that API access is switched on for it)";

/// Porkbun registrar client. Credentials travel in every request body.
pub struct PorkbunClient {
    client: reqwest::Client,
    api: ApiConfig,
}

#[derive(Debug, Serialize)]
struct Auth<'a> {
    apikey: &'a str,
    secretapikey: &'a str,
}

#[derive(Debug, Serialize)]
struct RecordRequest<'a> {
    #[serde(flatten)]
    auth: Auth<'a>,
    name: &'a str,
    #[serde(rename = "type")]
    record_type: &'static str,
    content: String,
    ttl: u32,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    records: Vec<DnsRecord>,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    status: String,
    #[serde(default, deserialize_with = "optional_id")]
    id: Option<String>,
}

fn optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    string_or_number(deserializer).map(Some)
}

impl PorkbunClient {
    /// Create a new client for the given endpoint and credentials.
    pub fn new(api: ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| DdnsError::registrar("setup", e.to_string()))?;

        Ok(Self { client, api })
    }

    fn auth(&self) -> Auth<'_> {
        Auth {
            apikey: &self.api.apikey,
            secretapikey: &self.api.secretapikey,
        }
    }

    fn record_request<'a>(&'a self, subdomain: &'a str, ip: Ipv4Addr) -> RecordRequest<'a> {
        RecordRequest {
            auth: self.auth(),
            name: subdomain,
            record_type: "A",
            content: ip.to_string(),
            ttl: RECORD_TTL,
        }
    }

    /// POST `body` to `{endpoint}{path}` and return the decoded JSON body.
    ///
    /// Fails on transport errors, non-2xx status, undecodable bodies, and
    /// bodies whose `status` is "ERROR".
    async fn post<B: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
    ) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.api.endpoint, path);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| DdnsError::registrar(operation, e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DdnsError::registrar(operation, e.to_string()))?;

        if !status.is_success() {
            return Err(DdnsError::Registrar {
                operation,
                status: Some(status.as_u16()),
                message: format!("Response: {text}"),
            });
        }

        let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            DdnsError::registrar(
                operation,
                format!("Failed to decode JSON response: {e}, raw response: {text}"),
            )
        })?;

        let envelope: StatusResponse = serde_json::from_value(value.clone()).map_err(|e| {
            DdnsError::registrar(operation, format!("{e}, raw response: {text}"))
        })?;

        if envelope.status == STATUS_ERROR {
            let mut message = envelope
                .message
                .unwrap_or_else(|| "registrar reported ERROR".to_string());
            if operation == "retrieve" {
                message.push_str(RETRIEVE_HINT);
            }
            return Err(DdnsError::registrar(operation, message));
        }

        Ok(value)
    }
}

#[async_trait]
impl Registrar for PorkbunClient {
    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>> {
        tracing::debug!("Fetching records for domain: {}", domain);

        let value = self
            .post("retrieve", &format!("/dns/retrieve/{domain}"), &self.auth())
            .await?;

        let response: RetrieveResponse = serde_json::from_value(value)
            .map_err(|e| DdnsError::registrar("retrieve", format!("Malformed record list: {e}")))?;

        tracing::debug!("{} record(s) in {}", response.records.len(), domain);
        Ok(response.records)
    }

    async fn delete_record(&self, domain: &str, id: &str) -> Result<()> {
        self.post("delete", &format!("/dns/delete/{domain}/{id}"), &self.auth())
            .await?;
        Ok(())
    }

    async fn create_record(
        &self,
        domain: &str,
        subdomain: &str,
        ip: Ipv4Addr,
    ) -> Result<CreateResult> {
        tracing::debug!(
            "Creating new A record for {:?} in {} with IP {}",
            subdomain,
            domain,
            ip
        );

        let value = self
            .post(
                "create",
                &format!("/dns/create/{domain}"),
                &self.record_request(subdomain, ip),
            )
            .await?;

        let response: CreateResponse = serde_json::from_value(value)
            .map_err(|e| DdnsError::registrar("create", format!("Malformed response: {e}")))?;

        Ok(CreateResult {
            status: response.status,
            id: response.id,
        })
    }

    async fn edit_record(
        &self,
        domain: &str,
        id: &str,
        subdomain: &str,
        ip: Ipv4Addr,
    ) -> Result<CreateResult> {
        tracing::debug!("Editing record ID {} in {} to IP {}", id, domain, ip);

        let value = self
            .post(
                "edit",
                &format!("/dns/edit/{domain}/{id}"),
                &self.record_request(subdomain, ip),
            )
            .await?;

        let response: StatusResponse = serde_json::from_value(value)
            .map_err(|e| DdnsError::registrar("edit", format!("Malformed response: {e}")))?;

        Ok(CreateResult {
            status: response.status,
            id: Some(id.to_string()),
        })
    }
}
