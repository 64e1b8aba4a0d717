//! Public IPv4 detection.

use crate::config::DEFAULT_IP_SERVICE;
use crate::error::{DdnsError, Result};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("porkbun-ddns/", env!("CARGO_PKG_VERSION"));

/// IP detector backed by a single JSON echo service.
pub struct IpDetector {
    client: reqwest::Client,
    service: String,
}

#[derive(Debug, Deserialize)]
struct EchoResponse {
    #[serde(default)]
    ip_addr: String,
}

impl IpDetector {
    /// Create a new IP detector with the default service.
    pub fn new() -> Result<Self> {
        Self::with_service(DEFAULT_IP_SERVICE.to_string())
    }

    /// Create a new IP detector with a custom service.
    ///
    /// The client binds to the IPv4 wildcard address, so the lookup can only
    /// ever leave over IPv4 even when the service host also has AAAA records.
    pub fn with_service(service: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .local_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DdnsError::IpResolution(format!("Cannot build HTTP client: {e}")))?;

        Ok(Self { client, service })
    }

    /// Detect the public IPv4 address. No retries.
    pub async fn detect_ipv4(&self) -> Result<Ipv4Addr> {
        tracing::debug!("Retrieving external IPv4 from {}", self.service);

        let response = self
            .client
            .get(&self.service)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                DdnsError::IpResolution(format!("Request to {} failed: {e}", self.service))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DdnsError::IpResolution(format!("Cannot read response body: {e}")))?;

        if !status.is_success() {
            return Err(DdnsError::IpResolution(format!(
                "HTTP {} from {}, response: {}",
                status, self.service, body
            )));
        }

        let echo: EchoResponse = serde_json::from_str(&body).map_err(|e| {
            DdnsError::IpResolution(format!(
                "Invalid JSON from {}: {e}, raw response: {body}",
                self.service
            ))
        })?;

        parse_ipv4(echo.ip_addr.trim())
    }
}

/// Validate an echoed address as IPv4, rejecting IPv6 literals outright.
fn parse_ipv4(ip: &str) -> Result<Ipv4Addr> {
    if ip.contains(':') {
        return Err(DdnsError::IpResolution(format!(
            "Got IPv6 address ({ip}) despite forcing IPv4. Check system settings or DNS resolution behavior."
        )));
    }

    ip.parse()
        .map_err(|_| DdnsError::IpResolution(format!("Invalid IPv4 address: {ip:?}")))
}
