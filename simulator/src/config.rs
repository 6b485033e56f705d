use anyhow::{Context, Result};
use fairstake_execution::EngineConfig;
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, str::FromStr};
use tracing::Level;

/// Simulator configuration, loaded from YAML.
///
/// Every field has a default so a partial file (or none at all) is valid.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    /// Fixed seed for a replayable session. When absent, server seeds come
    /// from the operating system and cannot be predicted.
    pub entropy: Option<u64>,
    pub client_seed: Option<String>,
    pub log_level: String,
    /// Autoplay tick.
    pub interval_ms: u64,
    /// Rounds to run before stopping (0 = until halted or interrupted).
    pub rounds: u64,
    /// Snapshot to load after bootstrapping the demo table.
    pub restore: Option<PathBuf>,
    /// Where to write the final snapshot.
    pub snapshot: Option<PathBuf>,
    /// Where to write the final analytics report.
    pub analytics: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            entropy: None,
            client_seed: None,
            log_level: "info".to_string(),
            interval_ms: 500,
            rounds: 100,
            restore: None,
            snapshot: None,
            analytics: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config file {}", path.display()))?;
        Self::parse(&file).with_context(|| format!("could not parse {}", path.display()))
    }

    pub fn parse(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.engine.validate().context("invalid engine config")?;
        Ok(config)
    }

    pub fn level(&self) -> Result<Level> {
        Level::from_str(&self.log_level)
            .with_context(|| format!("invalid log level {:?}", self.log_level))
    }
}
