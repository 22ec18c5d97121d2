//! Error types for the dreamdns updater
//!
//! Clients (resolver, record store) produce the leaf variants. The reconciler
//! wraps them in a stage variant so callers can tell which step of a cycle
//! failed without losing the underlying cause.

use thiserror::Error;

/// Result type alias for dreamdns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the dreamdns updater
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid required input
    #[error("Configuration error: {0}")]
    Config(String),

    /// The IP lookup service could not be reached or answered with a failure status
    #[error("IP lookup service unreachable: {0}")]
    UnreachableService(String),

    /// The IP lookup service answered with something that is not a usable address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Transport failure while talking to the DNS provider
    #[error("HTTP error: {0}")]
    Http(String),

    /// The DNS provider answered but reported a failure
    #[error("Provider error ({code}): {reason}")]
    Provider {
        /// Provider-supplied error code
        code: String,
        /// Provider-supplied human readable reason
        reason: String,
    },

    /// A response did not match the expected schema
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Resolving the public IP failed
    #[error("Resolving public IP failed: {0}")]
    ResolveFailed(#[source] Box<Error>),

    /// Listing the provider's records failed
    #[error("Listing records failed: {0}")]
    ListFailed(#[source] Box<Error>),

    /// Removing the stale record failed; no create was attempted
    #[error("Deleting {hostname} -> {value} failed: {source}")]
    DeleteFailed {
        hostname: String,
        value: String,
        #[source]
        source: Box<Error>,
    },

    /// Creating the record failed; after a replace the hostname has no A record
    #[error("Creating {hostname} -> {value} failed: {source}")]
    CreateFailed {
        hostname: String,
        value: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an unreachable lookup service error
    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::UnreachableService(msg.into())
    }

    /// Create an invalid address error
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::InvalidAddress(msg.into())
    }

    /// Create an HTTP transport error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a provider-reported error
    pub fn provider(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Provider {
            code: code.into(),
            reason: reason.into(),
        }
    }

    /// Create a protocol (schema mismatch) error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub(crate) fn resolve_failed(source: Error) -> Self {
        Self::ResolveFailed(Box::new(source))
    }

    pub(crate) fn list_failed(source: Error) -> Self {
        Self::ListFailed(Box::new(source))
    }

    pub(crate) fn delete_failed(
        hostname: impl Into<String>,
        value: impl Into<String>,
        source: Error,
    ) -> Self {
        Self::DeleteFailed {
            hostname: hostname.into(),
            value: value.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn create_failed(
        hostname: impl Into<String>,
        value: impl Into<String>,
        source: Error,
    ) -> Self {
        Self::CreateFailed {
            hostname: hostname.into(),
            value: value.into(),
            source: Box::new(source),
        }
    }

    /// The error this one wraps, if it is a reconciliation stage error
    pub fn inner(&self) -> Option<&Error> {
        match self {
            Self::ResolveFailed(source) | Self::ListFailed(source) => Some(source),
            Self::DeleteFailed { source, .. } | Self::CreateFailed { source, .. } => Some(source),
            _ => None,
        }
    }

    /// The provider's reason string, looking through stage wrappers
    pub fn provider_reason(&self) -> Option<&str> {
        match self {
            Self::Provider { reason, .. } => Some(reason),
            _ => self.inner().and_then(Error::provider_reason),
        }
    }

    /// The provider's error code, looking through stage wrappers
    pub fn provider_code(&self) -> Option<&str> {
        match self {
            Self::Provider { code, .. } => Some(code),
            _ => self.inner().and_then(Error::provider_code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_reason_is_visible_through_stage_wrapper() {
        let err = Error::list_failed(Error::provider("error", "invalid api key"));

        assert_eq!(err.provider_reason(), Some("invalid api key"));
        assert_eq!(err.provider_code(), Some("error"));
        assert!(err.to_string().contains("invalid api key"));
    }

    #[test]
    fn transport_errors_carry_no_provider_reason() {
        let err = Error::delete_failed("h.example.com", "9.9.9.9", Error::http("timed out"));

        assert!(err.provider_reason().is_none());
        assert!(matches!(err.inner(), Some(Error::Http(_))));
    }

    #[test]
    fn source_chain_is_preserved() {
        use std::error::Error as _;

        let err = Error::resolve_failed(Error::invalid_address("not-an-ip"));
        let source = err.source().map(|s| s.to_string());

        assert_eq!(source.as_deref(), Some("Invalid address: not-an-ip"));
    }
}
