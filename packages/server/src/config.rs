use std::env;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use dotenvy::dotenv;

/// Tick period used when `POLL_INTERVAL_SECS` is unset.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Absent keys do not block startup; submissions are rejected instead.
    pub clado_api_key: Option<String>,
    pub clado_base_url: Option<String>,
    pub poll_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            clado_api_key: env::var("CLADO_API_KEY").ok().filter(|k| !k.is_empty()),
            clado_base_url: env::var("CLADO_BASE_URL").ok(),
            poll_interval: parse_poll_interval(env::var("POLL_INTERVAL_SECS").ok().as_deref())?,
        })
    }
}

/// Parse the poll period. Unset means the default; zero is rejected because
/// the poll timer needs a non-zero period.
fn parse_poll_interval(raw: Option<&str>) -> Result<Duration> {
    let secs: u64 = match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .context("POLL_INTERVAL_SECS must be a whole number of seconds")?,
        None => DEFAULT_POLL_INTERVAL_SECS,
    };
    ensure!(secs > 0, "POLL_INTERVAL_SECS must be greater than zero");
    Ok(Duration::from_secs(secs))
}
