use crate::error::{CoreError, Result};
use bitcoin::secp256k1::PublicKey;
use bitcoin::{Amount, CompressedPublicKey, Network};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Player identity: the P2WPKH address of a compressed secp256k1 key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn from_public_key(public_key: &PublicKey, network: Network) -> Self {
        let compressed = CompressedPublicKey(*public_key);
        let address = bitcoin::Address::p2wpkh(&compressed, network);
        Self(address.to_string())
    }

    /// Parse an address, rejecting anything that is not valid on `network`.
    pub fn parse(s: &str, network: Network) -> Result<Self> {
        let unchecked = bitcoin::Address::from_str(s)
            .map_err(|e| CoreError::InvalidAddress(format!("{}: {}", s, e)))?;
        let checked = unchecked
            .require_network(network)
            .map_err(|e| CoreError::InvalidAddress(format!("{}: {}", s, e)))?;
        Ok(Self(checked.to_string()))
    }

    /// Rebuild an address read back from our own storage; no validation.
    pub fn from_stored(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for tables and log lines.
    pub fn short(&self) -> String {
        if self.0.len() <= 14 {
            return self.0.clone();
        }
        format!("{}...{}", &self.0[..8], &self.0[self.0.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: Address,
    pub balance: Amount,
    pub nonce: u64,
}

impl AccountInfo {
    pub fn empty(address: Address) -> Self {
        Self {
            address,
            balance: Amount::ZERO,
            nonce: 0,
        }
    }
}
