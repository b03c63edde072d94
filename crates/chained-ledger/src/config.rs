use std::time::Duration;

use chained_crypto::{Miner, MiningBudget};
use serde::{Deserialize, Serialize};

/// Difficulty used to seal a freshly created genesis block.
pub const DEFAULT_GENESIS_DIFFICULTY: u32 = 16;

/// Ledger settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Difficulty of the genesis block synthesized for an empty store.
    pub genesis_difficulty: u32,
    /// How blocks are sealed.
    pub mining: MiningConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            genesis_difficulty: DEFAULT_GENESIS_DIFFICULTY,
            mining: MiningConfig::default(),
        }
    }
}

/// Proof-of-work settings. The default is one worker with no limits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// Number of threads probing the nonce space.
    pub workers: usize,
    /// Give up after this many digests.
    pub max_attempts: Option<u64>,
    /// Give up after this many seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            max_attempts: None,
            timeout_secs: None,
        }
    }
}

impl MiningConfig {
    pub fn budget(&self) -> MiningBudget {
        MiningBudget {
            max_attempts: self.max_attempts,
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn miner(&self) -> Miner {
        Miner::new(self.workers).with_budget(self.budget())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.genesis_difficulty, 16);
        assert_eq!(config.mining.workers, 1);
        assert!(config.mining.budget().is_unbounded());
    }

    #[test]
    fn mining_config_builds_budget() {
        let mining = MiningConfig {
            workers: 4,
            max_attempts: Some(1_000),
            timeout_secs: Some(3),
        };
        let miner = mining.miner();
        assert_eq!(miner.workers(), 4);
        assert_eq!(miner.budget().max_attempts, Some(1_000));
        assert_eq!(miner.budget().timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: LedgerConfig = toml::from_str("[mining]\nworkers = 2\n").unwrap();
        assert_eq!(config.genesis_difficulty, DEFAULT_GENESIS_DIFFICULTY);
        assert_eq!(config.mining.workers, 2);
        assert_eq!(config.mining.max_attempts, None);
    }
}
