//! Configuration module for environment variables and application settings
//!
//! The loaded [`Config`] is passed explicitly to the server and ledger
//! constructors; nothing reads configuration ambiently after startup.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Result, anyhow};

#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Ledger core configuration
    pub ledger: LedgerConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// How long a submission waits for a terminal decision
    pub confirmation_timeout: Duration,
    /// Bound on concurrently executing transactions
    pub max_in_flight: usize,
    /// Capacity of the submission queue
    pub queue_depth: usize,
    /// Artificial latency applied before each execution, for exercising
    /// client timeout handling against the sandbox
    pub dispatch_delay: Option<Duration>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::from_millis(5_000),
            max_in_flight: 8,
            queue_depth: 256,
            dispatch_delay: None,
        }
    }
}

/// Read `key` as a number, falling back to `default` when unset. A value
/// that is set but unparsable is a hard error rather than a silent default.
fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow!("{key} must be a number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = LedgerConfig::default();

        Ok(Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: env_parse("SERVER_PORT", 3000)?,
            },

            ledger: LedgerConfig {
                confirmation_timeout: Duration::from_millis(env_parse(
                    "CONFIRMATION_TIMEOUT_MS",
                    defaults.confirmation_timeout.as_millis() as u64,
                )?),
                max_in_flight: env_parse("MAX_IN_FLIGHT", defaults.max_in_flight)?,
                queue_depth: env_parse("QUEUE_DEPTH", defaults.queue_depth)?,
                dispatch_delay: env::var("DISPATCH_DELAY_MS")
                    .ok()
                    .map(|raw| {
                        raw.parse()
                            .map(Duration::from_millis)
                            .map_err(|_| anyhow!("DISPATCH_DELAY_MS must be a number, got {raw:?}"))
                    })
                    .transpose()?,
            },
        })
    }
}
