// # IP Resolver Trait
//
// Defines the interface for discovering the host's current public IP address.
//
// ## Implementations
//
// - Plain-text HTTP lookup service: `dreamdns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use dreamdns_core::IpResolver;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let resolver = /* IpResolver implementation */;
//     let ip = resolver.resolve().await?;
//     println!("public IP: {ip}");
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for public IP resolver implementations
///
/// A resolver performs exactly one lookup per call. It must not cache
/// results between calls and must not retry: the scheduler owns retry by
/// running the next cycle.
///
/// # Errors
///
/// - [`Error::UnreachableService`](crate::Error::UnreachableService): the
///   lookup could not be completed (connect failure, timeout, non-2xx status)
/// - [`Error::InvalidAddress`](crate::Error::InvalidAddress): the service
///   answered with something that is not an acceptable address
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Look up the current public IP address
    async fn resolve(&self) -> Result<IpAddr, crate::Error>;

    /// Name of the resolver (for logging)
    fn resolver_name(&self) -> &'static str;
}
