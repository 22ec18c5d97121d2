// # dreamdns-update
//
// Keeps one DreamHost A record pointed at this host's public IP.
//
// This binary is a thin integration layer: it parses input, sets up logging
// and the runtime, wires the resolver and record store into the scheduler,
// and maps the result to an exit code. All reconciliation logic lives in
// dreamdns-core.
//
// ## Configuration
//
// Every flag can also be set through its environment variable:
//
// - `--api-key` / `DREAMDNS_API_KEY`: DreamHost API key with DNS rw permission (required)
// - `--record` / `DREAMDNS_RECORD`: A record to check/create/modify (required)
// - `--interval` / `DREAMDNS_INTERVAL`: seconds between cycles, 0 = run once
// - `--dry-run` / `DREAMDNS_DRY_RUN`: log add/remove requests instead of sending them
// - `--api-url` / `DREAMDNS_API_URL`: DreamHost API endpoint
// - `--ip-lookup-url` / `DREAMDNS_IP_LOOKUP_URL`: plain-text public IP service
// - `--timeout` / `DREAMDNS_TIMEOUT`: per-request timeout in seconds
// - `--log-level` / `DREAMDNS_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export DREAMDNS_API_KEY=your_key
// dreamdns-update --record home.example.com --interval 300
// ```

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use clap::error::ErrorKind;
use dreamdns_core::config::{DEFAULT_API_URL, DEFAULT_IP_LOOKUP_URL, DEFAULT_TIMEOUT_SECS};
use dreamdns_core::{LastSuccess, Reconciler, Scheduler, UpdaterConfig, interval_ticks};
use dreamdns_ip_http::HttpIpResolver;
use dreamdns_provider_dreamhost::DreamhostStore;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Success (single cycle) or clean shutdown (interval mode)
/// - 1: Configuration error
/// - 2: Runtime error (first cycle failed, runtime could not start)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DreamdnsExitCode {
    /// Normal exit
    Success = 0,
    /// Missing or invalid input
    ConfigError = 1,
    /// Reconciliation or runtime failure
    RuntimeError = 2,
}

impl From<DreamdnsExitCode> for ExitCode {
    fn from(code: DreamdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(
    name = "dreamdns-update",
    version,
    about = "Keep a DreamHost A record pointed at this host's public IP"
)]
struct Cli {
    /// DreamHost API key with DNS read/write permission
    #[arg(long, env = "DREAMDNS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// DNS A record to check/create/modify
    #[arg(long, env = "DREAMDNS_RECORD")]
    record: Option<String>,

    /// Seconds between reconciliations; 0 runs once
    #[arg(long, env = "DREAMDNS_INTERVAL", default_value_t = 0)]
    interval: u64,

    /// Log add/remove requests instead of sending them
    #[arg(long, env = "DREAMDNS_DRY_RUN")]
    dry_run: bool,

    /// Keep running in interval mode even if the first reconciliation fails
    #[arg(long)]
    keep_going: bool,

    /// DreamHost API endpoint
    #[arg(long, env = "DREAMDNS_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Service answering with this host's public IP as plain text
    #[arg(long, env = "DREAMDNS_IP_LOOKUP_URL", default_value = DEFAULT_IP_LOOKUP_URL)]
    ip_lookup_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "DREAMDNS_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Accept an IPv6 answer from the lookup service
    #[arg(long)]
    allow_ipv6: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, env = "DREAMDNS_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Build and validate the updater configuration
    fn to_config(&self) -> Result<UpdaterConfig> {
        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow!("required flag --api-key (or DREAMDNS_API_KEY)"))?;
        let record = self
            .record
            .clone()
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| anyhow!("required flag --record (or DREAMDNS_RECORD)"))?;

        let mut config = UpdaterConfig::new(api_key, record.trim());
        config.provider.api_url = self.api_url.clone();
        config.provider.timeout_secs = self.timeout;
        config.ip_lookup.url = self.ip_lookup_url.clone();
        config.ip_lookup.timeout_secs = self.timeout;
        config.ip_lookup.require_ipv4 = !self.allow_ipv6;
        config.interval_secs = self.interval;
        config.dry_run = self.dry_run;
        config.fail_fast = !self.keep_going;

        config.validate()?;
        Ok(config)
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            other => Err(anyhow!(
                "log level '{}' is not valid. Valid levels: trace, debug, info, warn, error",
                other
            )),
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            return DreamdnsExitCode::ConfigError.into();
        }
    };

    let (config, log_level) = match cli.to_config().and_then(|c| Ok((c, cli.log_level()?))) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DreamdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DreamdnsExitCode::ConfigError.into();
    }

    info!("Starting dreamdns-update for {}", config.hostname);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DreamdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(config)).into()
}

/// Wire the components and run the scheduler
async fn run(config: UpdaterConfig) -> DreamdnsExitCode {
    let scheduler = match build_scheduler(&config) {
        Ok(scheduler) => scheduler,
        Err(e) => {
            error!("Failed to initialize: {:#}", e);
            return DreamdnsExitCode::ConfigError;
        }
    };
    let last_success = Arc::new(LastSuccess::new());
    let scheduler = scheduler.with_observer(last_success.clone());

    let result = match scheduler.policy().interval {
        None => {
            scheduler
                .run(tokio_stream::empty::<()>(), std::future::pending::<()>())
                .await
        }
        Some(period) => {
            scheduler
                .run(interval_ticks(period), shutdown_signal())
                .await
        }
    };

    match result {
        Ok(summary) => {
            info!(
                "Finished: {} cycle(s), {} change(s), {} failure(s)",
                summary.cycles, summary.changes, summary.failures
            );
            if let Some(at) = last_success.last_success() {
                info!("Last successful reconciliation at {}", at.to_rfc3339());
            }
            DreamdnsExitCode::Success
        }
        Err(e) => {
            error!("Reconciliation failed: {}", e);
            DreamdnsExitCode::RuntimeError
        }
    }
}

fn build_scheduler(config: &UpdaterConfig) -> Result<Scheduler> {
    let resolver =
        HttpIpResolver::from_config(&config.ip_lookup).context("building IP resolver")?;
    let store =
        DreamhostStore::new(&config.provider, config.dry_run).context("building record store")?;

    Ok(Scheduler::new(
        Reconciler::new(Box::new(resolver), Box::new(store)),
        config.hostname.clone(),
        config.retry_policy(),
    ))
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn shutdown_signal() {
    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(term), Ok(int)) => (term, int),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Failed to set up signal handlers ({}), using Ctrl-C only", e);
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    info!("Received {}", name);
}

/// Wait for Ctrl-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to wait for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
