use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::modules::offline_sync::core::merge::ConflictPolicy;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub api_url: String,
    pub data_dir: PathBuf,
    pub request_timeout: Duration,
    pub probe_timeout: Duration,
    pub probe_interval: Duration,
    pub conflict_policy: ConflictPolicy,
    pub max_replay_attempts: u32,
}

impl AppConfig {
    /// Reads `INVENTORY_*` variables, after loading a `.env` file when one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &'static str, default: &str| -> String {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            bind_addr: parse("INVENTORY_BIND_ADDR", read("INVENTORY_BIND_ADDR", "0.0.0.0:5000"))?,
            api_url: read("INVENTORY_API_URL", "http://localhost:5000")
                .trim_end_matches('/')
                .to_string(),
            data_dir: PathBuf::from(read("INVENTORY_DATA_DIR", ".inventory")),
            request_timeout: millis(
                "INVENTORY_REQUEST_TIMEOUT_MS",
                read("INVENTORY_REQUEST_TIMEOUT_MS", "5000"),
            )?,
            probe_timeout: millis(
                "INVENTORY_PROBE_TIMEOUT_MS",
                read("INVENTORY_PROBE_TIMEOUT_MS", "2000"),
            )?,
            probe_interval: millis(
                "INVENTORY_PROBE_INTERVAL_MS",
                read("INVENTORY_PROBE_INTERVAL_MS", "5000"),
            )?,
            conflict_policy: parse(
                "INVENTORY_CONFLICT_POLICY",
                read("INVENTORY_CONFLICT_POLICY", "server-wins"),
            )?,
            max_replay_attempts: parse(
                "INVENTORY_MAX_REPLAY_ATTEMPTS",
                read("INVENTORY_MAX_REPLAY_ATTEMPTS", "5"),
            )?,
        })
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

fn millis(key: &'static str, value: String) -> Result<Duration, ConfigError> {
    match parse::<u64>(key, value.clone())? {
        0 => Err(ConfigError::Invalid { key, value }),
        ms => Ok(Duration::from_millis(ms)),
    }
}
