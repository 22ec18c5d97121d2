//! Configuration types for the dreamdns updater
//!
//! This module defines the configuration consumed by the reconciler and
//! scheduler, plus validation of the required inputs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::scheduler::RetryPolicy;

/// Default DreamHost API endpoint
pub const DEFAULT_API_URL: &str = "https://api.dreamhost.com/";

/// Default public IP lookup service
pub const DEFAULT_IP_LOOKUP_URL: &str = "http://myexternalip.com/raw";

/// Default timeout for every outbound request (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Upper bound for configured timeouts (seconds)
const MAX_TIMEOUT_SECS: u64 = 60;

/// Main updater configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Public IP lookup configuration
    #[serde(default)]
    pub ip_lookup: IpLookupConfig,

    /// Hostname whose A record is managed (e.g., "home.example.com")
    pub hostname: String,

    /// Seconds between cycles; 0 runs a single cycle
    #[serde(default)]
    pub interval_secs: u64,

    /// Simulate mutations instead of sending them
    #[serde(default)]
    pub dry_run: bool,

    /// Whether a failure of the first cycle in interval mode is fatal
    #[serde(default = "default_fail_fast")]
    pub fail_fast: bool,
}

impl UpdaterConfig {
    /// Create a configuration with defaults for everything but the inputs
    ///
    /// The hostname is stored lowercased, the form DreamHost lists.
    pub fn new(api_key: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            provider: ProviderConfig::new(api_key),
            ip_lookup: IpLookupConfig::default(),
            hostname: hostname.into().to_ascii_lowercase(),
            interval_secs: 0,
            dry_run: false,
            fail_fast: default_fail_fast(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.ip_lookup.validate()?;
        validate_hostname(&self.hostname)?;
        Ok(())
    }

    /// Retry policy derived from the interval and fail-fast settings
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::every(Duration::from_secs(self.interval_secs)).with_fail_fast(self.fail_fast)
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key with DNS read/write permission
    pub api_key: String,

    /// API endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

// The API key never reaches logs
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<REDACTED>")
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ProviderConfig {
    /// Create a provider configuration with the default endpoint and timeout
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_key.trim().is_empty() {
            return Err(crate::Error::config("API key is required"));
        }
        validate_url("API URL", &self.api_url)?;
        validate_timeout("API timeout", self.timeout_secs)
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Public IP lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpLookupConfig {
    /// URL answering with the caller's IP as plain text
    #[serde(default = "default_ip_lookup_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Reject addresses that are not IPv4
    #[serde(default = "default_require_ipv4")]
    pub require_ipv4: bool,
}

impl IpLookupConfig {
    /// Validate the lookup configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_url("IP lookup URL", &self.url)?;
        validate_timeout("IP lookup timeout", self.timeout_secs)
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for IpLookupConfig {
    fn default() -> Self {
        Self {
            url: default_ip_lookup_url(),
            timeout_secs: default_timeout_secs(),
            require_ipv4: default_require_ipv4(),
        }
    }
}

fn validate_url(what: &str, url: &str) -> Result<(), crate::Error> {
    if url.is_empty() {
        return Err(crate::Error::config(format!("{what} cannot be empty")));
    }
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(crate::Error::config(format!(
            "{what} must use HTTP or HTTPS scheme. Got: {url}"
        )));
    }
    Ok(())
}

fn validate_timeout(what: &str, secs: u64) -> Result<(), crate::Error> {
    if !(1..=MAX_TIMEOUT_SECS).contains(&secs) {
        return Err(crate::Error::config(format!(
            "{what} must be between 1 and {MAX_TIMEOUT_SECS} seconds. Got: {secs}"
        )));
    }
    Ok(())
}

/// Validate that a string is a usable DNS hostname
///
/// Basic RFC 1035 checks: total length, label length, and label characters.
pub fn validate_hostname(hostname: &str) -> Result<(), crate::Error> {
    if hostname.is_empty() {
        return Err(crate::Error::config("Hostname is required"));
    }

    // RFC 1035: 253 chars max
    if hostname.len() > 253 {
        return Err(crate::Error::config(format!(
            "Hostname too long: {} chars (max 253). Got: {}",
            hostname.len(),
            hostname
        )));
    }

    for label in hostname.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Hostname has empty label: '{hostname}'"
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Hostname label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(crate::Error::config(format!(
                "Hostname label contains invalid characters. Label: '{label}'. \
                Valid: alphanumeric and hyphen only."
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Hostname label cannot start or end with hyphen. Label: '{label}'"
            )));
        }
    }

    Ok(())
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_ip_lookup_url() -> String {
    DEFAULT_IP_LOOKUP_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_require_ipv4() -> bool {
    true
}

fn default_fail_fast() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = UpdaterConfig::new("key", "home.example.com");
        assert!(config.validate().is_ok());
        assert_eq!(config.provider.timeout(), Duration::from_secs(5));
        assert!(config.ip_lookup.require_ipv4);
        assert!(config.retry_policy().is_single_shot());
    }

    #[test]
    fn hostname_is_lowercased() {
        let config = UpdaterConfig::new("key", "Home.Example.com");
        assert_eq!(config.hostname, "home.example.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_key_is_config_error() {
        let config = UpdaterConfig::new("  ", "home.example.com");
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn hostname_rules() {
        assert!(validate_hostname("").is_err());
        assert!(validate_hostname("a..b").is_err());
        assert!(validate_hostname("-a.example.com").is_err());
        assert!(validate_hostname("a_b.example.com").is_err());
        assert!(validate_hostname(&"a".repeat(64)).is_err());
        assert!(validate_hostname("home-1.example.com").is_ok());
    }

    #[test]
    fn timeouts_are_bounded() {
        let mut config = UpdaterConfig::new("key", "home.example.com");
        config.ip_lookup.timeout_secs = 0;
        assert!(config.validate().is_err());

        config.ip_lookup.timeout_secs = 5;
        config.provider.timeout_secs = 61;
        assert!(config.validate().is_err());
    }

    #[test]
    fn interval_builds_retry_policy() {
        let mut config = UpdaterConfig::new("key", "home.example.com");
        config.interval_secs = 300;
        config.fail_fast = false;

        let policy = config.retry_policy();
        assert_eq!(policy.interval, Some(Duration::from_secs(300)));
        assert!(!policy.fail_fast);
    }

    #[test]
    fn debug_hides_api_key() {
        let config = ProviderConfig::new("secret_key_12345");
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("secret_key"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{"provider":{"api_key":"k"},"hostname":"h.example.com"}"#;
        let config: UpdaterConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.provider.api_url, DEFAULT_API_URL);
        assert_eq!(config.ip_lookup.url, DEFAULT_IP_LOOKUP_URL);
        assert!(config.fail_fast);
        assert!(!config.dry_run);
    }
}
