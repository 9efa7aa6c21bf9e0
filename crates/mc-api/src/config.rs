//! Process configuration from environment variables.

use mc_gateway::JobDefaults;
use mc_runner::JobRunnerConfig;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Pre-shared provider key used when `MC_PROVIDER_KEY` is unset. Temporary.
pub const DEFAULT_PROVIDER_KEY: &str = "mutualcloud-temp-key";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid MC_LISTEN address {0:?}: {1}")]
    Listen(String, std::net::AddrParseError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen: SocketAddr,
    /// SQLite file; `None` keeps everything in memory.
    pub database: Option<PathBuf>,
    pub provider_key: String,
    pub seed: bool,
    pub runner: JobRunnerConfig,
    pub jobs: JobDefaults,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen_raw = std::env::var("MC_LISTEN").unwrap_or_else(|_| "0.0.0.0:5000".to_string());
        let listen = listen_raw
            .parse()
            .map_err(|e| ConfigError::Listen(listen_raw.clone(), e))?;
        let database = std::env::var("MC_DATABASE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let provider_key = std::env::var("MC_PROVIDER_KEY")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_PROVIDER_KEY.to_string());
        let seed = std::env::var("MC_SEED")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Ok(Self {
            listen,
            database,
            provider_key,
            seed,
            runner: JobRunnerConfig::from_env(),
            jobs: JobDefaults::from_env(),
        })
    }
}
