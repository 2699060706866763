//! Configuration management for ChainTube

use crate::error::{ChainError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "CHAINTUBE_CONFIG";

/// Config file looked up in the working directory when no override is set.
pub const DEFAULT_CONFIG_FILE: &str = "chaintube.toml";

/// Settings applied to every environment created by a bridge.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TubeConfig {
    #[serde(default = "default_chain_id")]
    pub chain_id: String,
    #[serde(default = "default_bond_denom")]
    pub bond_denom: String,
    /// Time delta of the block produced while creating an environment.
    #[serde(default = "default_block_time_secs")]
    pub genesis_block_time_secs: u64,
    /// Time delta used by `BeginBlock` when the caller gives none.
    #[serde(default = "default_block_time_secs")]
    pub block_time_secs: u64,
    #[serde(default = "default_validator_count")]
    pub validator_count: usize,
    #[serde(default = "default_validator_stake")]
    pub validator_stake: u128,
}

impl Default for TubeConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            bond_denom: default_bond_denom(),
            genesis_block_time_secs: default_block_time_secs(),
            block_time_secs: default_block_time_secs(),
            validator_count: default_validator_count(),
            validator_stake: default_validator_stake(),
        }
    }
}

impl TubeConfig {
    /// Parses a TOML document; missing keys fall back to defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: TubeConfig =
            toml::from_str(s).map_err(|e| ChainError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)?;
        Self::from_toml_str(&config_str)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chain_id.is_empty() {
            return Err(ChainError::ConfigError("chain_id must not be empty".to_string()));
        }
        if self.bond_denom.is_empty() {
            return Err(ChainError::ConfigError("bond_denom must not be empty".to_string()));
        }
        if self.validator_count == 0 {
            return Err(ChainError::ConfigError(
                "validator_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads the config named by `CHAINTUBE_CONFIG`, else `chaintube.toml`, else defaults.
pub fn load_config() -> Result<TubeConfig> {
    let path = match std::env::var_os(CONFIG_ENV_VAR) {
        Some(p) => PathBuf::from(p),
        None => {
            let local = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !local.exists() {
                return Ok(TubeConfig::default());
            }
            local
        }
    };
    TubeConfig::from_file(&path)
}

fn default_chain_id() -> String {
    "injective-777".to_string()
}

fn default_bond_denom() -> String {
    "inj".to_string()
}

fn default_block_time_secs() -> u64 {
    5
}

fn default_validator_count() -> usize {
    1
}

fn default_validator_stake() -> u128 {
    1_000_000_000_000_000_000_000_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = TubeConfig::from_toml_str("").unwrap();
        assert_eq!(config, TubeConfig::default());
        assert_eq!(config.chain_id, "injective-777");
        assert_eq!(config.block_time_secs, 5);
    }

    #[test]
    fn test_partial_document_overrides() {
        let config = TubeConfig::from_toml_str("chain_id = \"tube-1\"\nvalidator_count = 3\n").unwrap();
        assert_eq!(config.chain_id, "tube-1");
        assert_eq!(config.validator_count, 3);
        assert_eq!(config.bond_denom, "inj");
    }

    #[test]
    fn test_zero_validators_rejected() {
        let err = TubeConfig::from_toml_str("validator_count = 0").unwrap_err();
        assert!(err.to_string().contains("validator_count"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bond_denom = \"utube\"").unwrap();
        let config = TubeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.bond_denom, "utube");
    }
}
