//! FiveCard core - keys, storage, accounts and the encryption oracle
//!
//! Everything the game engine and its ledger host stand on: player
//! identities and signatures, the sqlite store, account balances, signed
//! transaction envelopes and the oracle that encrypts and reveals selections.

pub mod config;
pub mod crypto;
pub mod error;
pub mod keys;
pub mod ledger;
pub mod oracle;
pub mod storage;
pub mod types;

pub use config::LedgerConfig;
pub use crypto::MessageSignature;
pub use error::{CoreError, Result};
pub use keys::{KeyManager, PlayerKey};
pub use ledger::{Bank, Envelope};
pub use oracle::{
    CiphertextHandle, CiphertextVerifier, DecryptCapability, DecryptionOracle, EncryptedInput,
    LocalOracle,
};
pub use storage::Storage;
pub use types::{AccountInfo, Address};

pub use ::bitcoin::Amount;
pub use ::bitcoin::Network;

use std::path::Path;
use std::sync::Arc;

pub const DB_FILE: &str = "fivecard.db";

/// Open (or create) the ledger database inside `data_dir`.
pub async fn open_storage(data_dir: &Path) -> Result<Arc<Storage>> {
    Ok(Arc::new(Storage::new(&data_dir.join(DB_FILE)).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_key_creation() {
        let temp_dir = tempdir().unwrap();
        let storage = open_storage(temp_dir.path()).await.unwrap();
        let manager = KeyManager::new(storage, Network::Regtest);

        let (key, _mnemonic) = manager.create_key("test-key").await.unwrap();
        assert_eq!(key.name(), "test-key");
        assert_eq!(key.network(), Network::Regtest);
        assert!(temp_dir.path().join(DB_FILE).exists());
    }
}
