use std::path::{Path, PathBuf};

use anyhow::Context;
use chained_ledger::LedgerConfig;
use serde::{Deserialize, Serialize};

/// Settings read from the optional `--config` TOML file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Chain file used when `--store` is not given.
    pub store_path: PathBuf,
    /// Difficulty used by `append` when `-d` is not given.
    pub default_difficulty: u32,
    pub ledger: LedgerConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("blockchain.json"),
            default_difficulty: 8,
            ledger: LedgerConfig::default(),
        }
    }
}

impl CliConfig {
    /// Read `path`, or fall back to defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}
