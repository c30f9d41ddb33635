//! Environment-backed configuration.

use anyhow::Context;
use std::env;
use std::time::Duration;

/// Service configuration, read once at startup. `dotenvy` loads `.env`
/// before this runs.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    /// Bound on waiting for a pool connection; exceeded waits surface as
    /// transient store failures instead of hanging a request.
    pub db_acquire_timeout: Duration,
    /// How often the completed-bookings sweep runs.
    pub completed_sweep_interval: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let db_max_connections = parse_var("DB_MAX_CONNECTIONS", 10)?;
        let db_acquire_timeout = Duration::from_secs(parse_var("DB_ACQUIRE_TIMEOUT_SECS", 5)?);
        let completed_sweep_interval =
            Duration::from_secs(parse_var("COMPLETED_SWEEP_INTERVAL_SECS", 600)?);

        Ok(Config {
            database_url,
            bind_addr,
            db_max_connections,
            db_acquire_timeout,
            completed_sweep_interval,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{name} is not a valid value: {raw}")),
        Err(_) => Ok(default),
    }
}
