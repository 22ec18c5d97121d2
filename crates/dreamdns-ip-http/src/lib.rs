// # HTTP IP Resolver
//
// This crate provides an `IpResolver` that asks an external lookup service
// for the caller's public address.
//
// ## Architecture
//
// One GET per `resolve()` call. The service must answer with the address as
// the plain-text body (e.g. `http://myexternalip.com/raw`,
// `https://api.ipify.org`, `https://icanhazip.com`). Surrounding whitespace
// is ignored. Nothing is cached: every cycle sees a fresh answer.

use dreamdns_core::config::IpLookupConfig;
use dreamdns_core::traits::IpResolver;
use dreamdns_core::{Error, Result};

use std::net::IpAddr;
use std::time::Duration;

/// HTTP-based public IP resolver
#[derive(Debug)]
pub struct HttpIpResolver {
    /// URL to fetch the address from
    url: String,

    /// Reject non-IPv4 answers
    require_ipv4: bool,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Create a resolver
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch the address from
    /// - `timeout`: bound on the whole request
    /// - `require_ipv4`: reject IPv6 answers with `InvalidAddress`
    pub fn new(url: impl Into<String>, timeout: Duration, require_ipv4: bool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            require_ipv4,
            client,
        })
    }

    /// Create a resolver from lookup configuration
    pub fn from_config(config: &IpLookupConfig) -> Result<Self> {
        Self::new(config.url.clone(), config.timeout(), config.require_ipv4)
    }

    /// Parse and check a lookup service answer
    fn parse_answer(&self, body: &str) -> Result<IpAddr> {
        let text = body.trim();

        let ip: IpAddr = text
            .parse()
            .map_err(|_| Error::invalid_address(format!("'{}' is not an IP address", text)))?;

        if self.require_ipv4 && !ip.is_ipv4() {
            return Err(Error::invalid_address(format!("Expected IPv4, got: {}", ip)));
        }

        Ok(ip)
    }
}

#[async_trait::async_trait]
impl IpResolver for HttpIpResolver {
    async fn resolve(&self) -> Result<IpAddr> {
        tracing::debug!("Looking up public IP via {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::unreachable(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::unreachable(format!("HTTP error: {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::unreachable(format!("Failed to read response: {}", e)))?;

        self.parse_answer(&body)
    }

    fn resolver_name(&self) -> &'static str {
        "http"
    }
}
