use crate::error::{CoreError, Result};
use bitcoin::{Amount, Network};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "fivecard.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub network: Network,
    pub faucet_enabled: bool,
    /// Largest amount a single faucet request may mint.
    pub faucet_max: Amount,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::new(Network::Regtest)
    }
}

impl LedgerConfig {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            // free coins only make sense off mainnet
            faucet_enabled: network != Network::Bitcoin,
            faucet_max: Amount::from_sat(100),
        }
    }

    /// Read `fivecard.json` from `data_dir`, falling back to defaults when
    /// the file does not exist.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        let config = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, data_dir: &Path) -> Result<()> {
        self.validate()?;
        std::fs::create_dir_all(data_dir)?;
        std::fs::write(
            data_dir.join(CONFIG_FILE),
            serde_json::to_string_pretty(self)?,
        )?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.faucet_enabled && self.faucet_max == Amount::ZERO {
            return Err(CoreError::config(
                "Faucet cap must be greater than 0 when the faucet is enabled",
            ));
        }

        if self.faucet_enabled && self.network == Network::Bitcoin {
            return Err(CoreError::config("Faucet cannot be enabled on mainnet"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_when_missing() {
        let dir = tempdir().unwrap();
        let config = LedgerConfig::load(dir.path()).unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.network, Network::Regtest);
        assert!(config.faucet_enabled);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let mut config = LedgerConfig::new(Network::Signet);
        config.faucet_max = Amount::from_sat(7);
        config.save(dir.path()).unwrap();

        assert_eq!(LedgerConfig::load(dir.path()).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), r#"{"faucet_enabled": false}"#).unwrap();

        let config = LedgerConfig::load(dir.path()).unwrap();
        assert!(!config.faucet_enabled);
        assert_eq!(config.network, Network::Regtest);
    }

    #[test]
    fn test_validate() {
        let mut config = LedgerConfig::default();
        config.faucet_max = Amount::ZERO;
        assert!(config.validate().is_err());

        let mut mainnet = LedgerConfig::new(Network::Bitcoin);
        assert!(!mainnet.faucet_enabled);
        assert!(mainnet.validate().is_ok());
        mainnet.faucet_enabled = true;
        assert!(mainnet.validate().is_err());
    }
}
