use crate::error::{CoreError, Result};
use crate::keys::{generate_mnemonic, mnemonic_to_keypair, PlayerKey};
use crate::storage::key_store::KeyData;
use crate::storage::{KeyStore, Storage};
use crate::types::Address;
use bitcoin::Network;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct KeySummary {
    pub name: String,
    pub address: Address,
    pub created_at: DateTime<Utc>,
}

pub struct KeyManager {
    storage: Arc<Storage>,
    network: Network,
    keys: Arc<RwLock<HashMap<String, Arc<PlayerKey>>>>,
}

impl KeyManager {
    pub fn new(storage: Arc<Storage>, network: Network) -> Self {
        Self {
            storage,
            network,
            keys: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Generate a fresh key. Returns the key and its mnemonic, which is shown
    /// to the user once.
    pub async fn create_key(&self, name: &str) -> Result<(Arc<PlayerKey>, String)> {
        let mnemonic = generate_mnemonic()?;
        let key = self.store_key(name, &mnemonic).await?;

        tracing::info!("Created key '{}' ({})", name, key.address());
        Ok((key, mnemonic))
    }

    pub async fn import_key(&self, name: &str, mnemonic: &str) -> Result<Arc<PlayerKey>> {
        let key = self.store_key(name, mnemonic).await?;

        tracing::info!("Imported key '{}' ({})", name, key.address());
        Ok(key)
    }

    pub async fn load_key(&self, name: &str) -> Result<Arc<PlayerKey>> {
        if let Some(key) = self.keys.read().get(name) {
            return Ok(key.clone());
        }

        let key_data = KeyStore::new(&self.storage).load_key_by_name(name).await?;
        if key_data.network != self.network {
            return Err(CoreError::key(format!(
                "Key '{}' belongs to {}, ledger runs on {}",
                name, key_data.network, self.network
            )));
        }

        let mnemonic = self.decrypt_mnemonic(&key_data.mnemonic)?;
        let keypair = mnemonic_to_keypair(&mnemonic, key_data.network)?;
        let key = Arc::new(PlayerKey::new(
            key_data.id,
            key_data.name,
            keypair,
            key_data.network,
            key_data.created_at,
        ));

        self.keys.write().insert(name.to_string(), key.clone());
        Ok(key)
    }

    pub async fn list_keys(&self) -> Result<Vec<KeySummary>> {
        let keys = KeyStore::new(&self.storage).list_keys().await?;
        Ok(keys
            .into_iter()
            .map(|k| KeySummary {
                name: k.name,
                address: Address::from_stored(k.address),
                created_at: k.created_at,
            })
            .collect())
    }

    pub async fn delete_key(&self, name: &str) -> Result<()> {
        let deleted = KeyStore::new(&self.storage).delete_key(name).await?;
        if !deleted {
            return Err(CoreError::KeyNotFound {
                name: name.to_string(),
            });
        }

        self.keys.write().remove(name);

        tracing::info!("Deleted key '{}'", name);
        Ok(())
    }

    async fn store_key(&self, name: &str, mnemonic: &str) -> Result<Arc<PlayerKey>> {
        let key_store = KeyStore::new(&self.storage);
        if key_store.key_exists(name).await? {
            return Err(CoreError::key(format!("Key '{}' already exists", name)));
        }

        let keypair = mnemonic_to_keypair(mnemonic, self.network)?;
        let key = Arc::new(PlayerKey::new(
            Uuid::new_v4().to_string(),
            name.to_string(),
            keypair,
            self.network,
            Utc::now(),
        ));

        let key_data = KeyData {
            id: key.id().to_string(),
            name: name.to_string(),
            network: self.network,
            address: key.address().to_string(),
            created_at: key.created_at(),
            mnemonic: self.encrypt_mnemonic(mnemonic),
        };
        key_store.save_key(&key_data).await?;

        self.keys.write().insert(name.to_string(), key.clone());
        Ok(key)
    }

    // TODO: encrypt stored mnemonics under a user passphrase.
    fn encrypt_mnemonic(&self, mnemonic: &str) -> Vec<u8> {
        mnemonic.as_bytes().to_vec()
    }

    fn decrypt_mnemonic(&self, stored: &[u8]) -> Result<String> {
        String::from_utf8(stored.to_vec())
            .map_err(|e| CoreError::internal(format!("Failed to read stored mnemonic: {}", e)))
    }
}
