//! # Ledger Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the repository adapter
//! - Create the ledger service
//! - Start the HTTP server

mod config;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ledger_hex::{LedgerService, RetryPolicy, inbound::HttpServer};
use ledger_repo::build_repo;
use ledger_types::ErrorKind;

/// `RUST_LOG` wins; `LOG_LEVEL` is honoured for older deployments.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| {
            let level = std::env::var("LOG_LEVEL").ok()?;
            EnvFilter::try_new(level.to_lowercase()).ok()
        })
        .unwrap_or_else(|| "info,ledger_app=debug,ledger_hex=debug".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Database scheme only, so credentials never reach the logs.
fn database_scheme(url: &str) -> &str {
    url.split_once(':').map_or("unknown", |(scheme, _)| scheme)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let config = config::Config::from_env().inspect_err(|e| {
        tracing::error!(kind = ?ErrorKind::Fatal, error = %e, "invalid configuration");
    })?;

    tracing::info!("Starting ledger server on port {}", config.port);
    tracing::info!(database = database_scheme(&config.database_url), "Using database");
    if let Some(cache_url) = &config.cache_url {
        tracing::info!(cache_url = %cache_url, "cache endpoint configured but unused");
    }

    // Build repository (handles connection and migration)
    let repo = build_repo(&config.database_url).await.inspect_err(|e| {
        tracing::error!(kind = ?ErrorKind::Fatal, error = %e, "failed to initialize database");
    })?;

    let retry = RetryPolicy::default().with_max_retries(config.settlement_max_retries);
    let service = LedgerService::with_retry_policy(repo, retry);

    let server = HttpServer::new(service).with_request_timeout(config.request_timeout);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    tracing::info!("Server stopped");
    Ok(())
}
