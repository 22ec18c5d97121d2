// # DreamHost Record Store
//
// This crate provides a `RecordStore` backed by the DreamHost API.
//
// ## API Reference
//
// Every call is a GET against the API endpoint with query parameters:
//
// ```http
// GET /?key=<key>&format=json&cmd=dns-list_records
// GET /?key=<key>&format=json&cmd=dns-add_record&type=A&record=<name>&value=<ip>
// GET /?key=<key>&format=json&cmd=dns-remove_record&type=A&record=<name>&value=<ip>
// ```
//
// Responses are JSON objects with a `result` of `"success"` or `"error"`.
// On success `data` holds the record list (list) or a status string
// (add/remove). On error `data` holds an error code and `reason`, when
// present, a human readable explanation.
//
// ## Constraints
//
// - One request per call, except the re-list described on `create`
// - No retry, no backoff, no caching; the scheduler owns retry
// - The API key never appears in logs or `Debug` output
// - Every request is bounded by the configured timeout

use async_trait::async_trait;
use dreamdns_core::config::ProviderConfig;
use dreamdns_core::traits::{ADDRESS_RECORD_TYPE, DnsRecord, RecordStore};
use dreamdns_core::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::net::IpAddr;

const CMD_LIST: &str = "dns-list_records";
const CMD_ADD: &str = "dns-add_record";
const CMD_REMOVE: &str = "dns-remove_record";

/// `result` value of a successful call
const RESULT_SUCCESS: &str = "success";

/// Prefix of the add-record error codes reporting an existing record
const ALREADY_EXISTS_PREFIX: &str = "record_already_exists";

/// Raw API response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse {
    result: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    reason: Option<String>,
}

impl ApiResponse {
    fn into_result(self) -> Result<Option<Value>> {
        if self.result == RESULT_SUCCESS {
            return Ok(self.data);
        }

        let code = match &self.data {
            Some(Value::String(code)) if !code.is_empty() => code.clone(),
            _ => self.result.clone(),
        };
        let reason = self.reason.unwrap_or_else(|| code.clone());
        Err(Error::provider(code, reason))
    }
}

/// DreamHost DNS record store
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the store will:
/// - Perform list requests
/// - Log the add/remove request it would have sent
/// - **NOT** send add/remove requests
pub struct DreamhostStore {
    /// API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// API endpoint
    api_url: String,

    /// HTTP client with the configured timeout
    client: reqwest::Client,

    /// Dry-run mode: list normally, simulate mutations
    dry_run: bool,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for DreamhostStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DreamhostStore")
            .field("api_key", &"<REDACTED>")
            .field("api_url", &self.api_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl DreamhostStore {
    /// Create a store from provider configuration
    ///
    /// # Errors
    ///
    /// `Error::Config` if the key is empty or the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig, dry_run: bool) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::config("DreamHost API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        if dry_run {
            tracing::warn!("DreamHost store running in DRY-RUN mode - no changes will be made");
        }

        Ok(Self {
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            client,
            dry_run,
        })
    }

    /// Send one API command and unwrap the response envelope
    async fn call(&self, cmd: &str, params: &[(&str, &str)]) -> Result<Option<Value>> {
        tracing::debug!("DreamHost {} {:?}", cmd, params);

        let response = self
            .client
            .get(&self.api_url)
            .query(&[("key", self.api_key.as_str()), ("format", "json"), ("cmd", cmd)])
            .query(params)
            .send()
            .await
            // without_url: the URL carries the API key
            .map_err(|e| Error::http(format!("{} request failed: {}", cmd, e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::http(format!("{} returned HTTP {}", cmd, status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read {} response: {}", cmd, e.without_url())))?;

        let envelope: ApiResponse = serde_json::from_str(&body)
            .map_err(|e| Error::protocol(format!("Malformed {} response: {}", cmd, e)))?;

        envelope.into_result()
    }

    /// Send an add/remove command, or log it in dry-run mode
    async fn mutate(&self, cmd: &str, hostname: &str, value: &str) -> Result<()> {
        let params = [
            ("type", ADDRESS_RECORD_TYPE),
            ("record", hostname),
            ("value", value),
        ];

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send {} for {} -> {}",
                cmd,
                hostname,
                value
            );
            return Ok(());
        }

        self.call(cmd, &params).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for DreamhostStore {
    async fn list(&self) -> Result<Vec<DnsRecord>> {
        let data = self
            .call(CMD_LIST, &[])
            .await?
            .ok_or_else(|| Error::protocol("List response has no data"))?;

        if !data.is_array() {
            return Err(Error::protocol("List response data is not an array"));
        }

        serde_json::from_value(data)
            .map_err(|e| Error::protocol(format!("Malformed record in list response: {}", e)))
    }

    /// Create an A record
    ///
    /// If DreamHost answers that the record already exists, the record list
    /// is fetched once more. The create succeeds if the exact
    /// `hostname -> value` record is present; otherwise (another value got
    /// there first) the provider error is returned and the next cycle
    /// reconciles it.
    async fn create(&self, hostname: &str, ip: IpAddr) -> Result<()> {
        let value = ip.to_string();

        match self.mutate(CMD_ADD, hostname, &value).await {
            Ok(()) => {
                if !self.dry_run {
                    tracing::info!("Created A record {} -> {}", hostname, value);
                }
                Ok(())
            }
            Err(e) if e.provider_code().is_some_and(|c| c.starts_with(ALREADY_EXISTS_PREFIX)) => {
                let present = self
                    .list()
                    .await?
                    .iter()
                    .any(|r| r.matches(hostname) && r.points_at(ip));

                if present {
                    tracing::info!("A record {} -> {} already exists", hostname, value);
                    Ok(())
                } else {
                    Err(e)
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, hostname: &str, value: &str) -> Result<()> {
        self.mutate(CMD_REMOVE, hostname, value).await?;
        if !self.dry_run {
            tracing::info!("Removed A record {} -> {}", hostname, value);
        }
        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn provider_name(&self) -> &'static str {
        "dreamhost"
    }
}
