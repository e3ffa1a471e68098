//! Configuration management for HashLedger

use crate::error::{ChainError, Result};
use crate::miner::MAX_DIFFICULTY;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "hashledger.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

// Low enough that a submission seals in milliseconds.
fn default_difficulty() -> u32 {
    2
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.ledger.difficulty > MAX_DIFFICULTY {
            return Err(ChainError::Config(format!(
                "ledger.difficulty must be at most {}, got {}",
                MAX_DIFFICULTY, self.ledger.difficulty
            )));
        }
        if self.server.port == 0 {
            return Err(ChainError::Config("server.port must be non-zero".to_string()));
        }
        if self.server.host.trim().is_empty() {
            return Err(ChainError::Config("server.host must be set".to_string()));
        }
        Ok(())
    }

    /// Apply the `PORT` environment variable on top of the file settings.
    pub fn apply_env(&mut self) {
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
    }
}

/// Read configuration from `path`. A missing file means all defaults.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let config = match fs::read_to_string(path) {
        Ok(contents) => toml::from_str::<Config>(&contents)?,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Config::default()
        }
        Err(e) => return Err(e.into()),
    };

    config.validate()?;
    Ok(config)
}

/// Read `path`, then apply environment overrides.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let mut config = load_config_from(path)?;
    config.apply_env();
    config.validate()?;
    Ok(config)
}
