//! Configuration loading from environment.

use std::env;
use std::time::Duration;

/// Application configuration.
#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Cache endpoint (`CACHE_URL`, else `REDIS_HOST`). Accepted for
    /// deployment compatibility; nothing is cached.
    pub cache_url: Option<String>,
    pub request_timeout: Duration,
    pub settlement_max_retries: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = var("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?;

        let database_url = var("DATABASE_URL")
            .filter(|url| !url.is_empty())
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let cache_url = var("CACHE_URL")
            .or_else(|| var("REDIS_HOST"))
            .filter(|url| !url.is_empty());

        let request_timeout = var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .map(Duration::from_secs)
            .map_err(|e| anyhow::anyhow!("invalid REQUEST_TIMEOUT_SECS: {}", e))?;

        let settlement_max_retries = var("SETTLEMENT_MAX_RETRIES")
            .unwrap_or_else(|| "3".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid SETTLEMENT_MAX_RETRIES: {}", e))?;

        Ok(Self {
            port,
            database_url,
            cache_url,
            request_timeout,
            settlement_max_retries,
        })
    }
}
