use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Block count of one activity window unless configured otherwise.
pub const DEFAULT_BLOCKS_PER_MONTH: u64 = 2_628_000;

/// ~30.4 days, used when the window is derived from `block_time_secs`.
pub const SECONDS_PER_MONTH: u64 = 2_628_000;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub general: General,
    pub chain: Chain,
    #[serde(default)]
    pub observability: Observability,
    pub web: Option<Web>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct General {
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chain {
    pub endpoints: Vec<String>,
    /// When set (and `blocks_per_month` is not), windows span
    /// `SECONDS_PER_MONTH / block_time_secs` blocks.
    pub block_time_secs: Option<u64>,
    #[serde(default)]
    pub confirmations_assumed_final: u64,
    pub blocks_per_month: Option<u64>,
    #[serde(default = "default_snapshot_timeout_secs")]
    pub snapshot_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_snapshot_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl Chain {
    pub fn blocks_per_month(&self) -> u64 {
        self.blocks_per_month
            .or_else(|| self.block_time_secs.map(|secs| SECONDS_PER_MONTH / secs.max(1)))
            .unwrap_or(DEFAULT_BLOCKS_PER_MONTH)
    }

    pub fn snapshot_timeout(&self) -> Duration {
        Duration::from_secs(self.snapshot_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Observability {
    pub prometheus_port: Option<u16>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Web {
    pub port: u16,
    pub host: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = std::env::var("PERSONA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {path}"))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let chain = &self.chain;
        if chain.endpoints.is_empty() {
            bail!("chain.endpoints must list at least one RPC endpoint");
        }
        if chain.block_time_secs == Some(0) {
            bail!("chain.block_time_secs must be > 0");
        }
        if chain.blocks_per_month == Some(0) {
            bail!("chain.blocks_per_month must be > 0");
        }
        if chain.snapshot_timeout_secs == 0 || chain.request_timeout_secs == 0 {
            bail!("chain timeouts must be > 0");
        }
        Ok(())
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_toml_str(s)
    }
}
