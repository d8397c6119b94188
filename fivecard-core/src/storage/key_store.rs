use crate::error::{CoreError, Result};
use crate::storage::Storage;
use bitcoin::Network;
use chrono::Utc;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyData {
    pub id: String,
    pub name: String,
    pub network: Network,
    pub address: String,
    pub created_at: chrono::DateTime<Utc>,
    pub mnemonic: Vec<u8>,
}

pub struct KeyStore<'a> {
    storage: &'a Storage,
}

impl<'a> KeyStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn save_key(&self, key_data: &KeyData) -> Result<()> {
        let conn = self.storage.get_connection().await;

        conn.execute(
            "INSERT INTO keys (id, name, network, address, created_at, mnemonic)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                key_data.id,
                key_data.name,
                key_data.network.to_string(),
                key_data.address,
                key_data.created_at.timestamp(),
                key_data.mnemonic,
            ],
        )?;

        Ok(())
    }

    pub async fn load_key_by_name(&self, name: &str) -> Result<KeyData> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT id, name, network, address, created_at, mnemonic
             FROM keys WHERE name = ?1",
        )?;

        let mut rows = stmt.query_map(params![name], key_from_row)?;
        let first = rows.next();
        match first {
            Some(row) => Ok(row?),
            None => Err(CoreError::KeyNotFound {
                name: name.to_string(),
            }),
        }
    }

    pub async fn list_keys(&self) -> Result<Vec<KeyData>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT id, name, network, address, created_at, mnemonic
             FROM keys ORDER BY created_at ASC, name ASC",
        )?;

        let key_iter = stmt.query_map([], key_from_row)?;

        let mut keys = Vec::new();
        for key in key_iter {
            keys.push(key?);
        }

        Ok(keys)
    }

    pub async fn delete_key(&self, name: &str) -> Result<bool> {
        let conn = self.storage.get_connection().await;
        let deleted = conn.execute("DELETE FROM keys WHERE name = ?1", params![name])?;
        Ok(deleted > 0)
    }

    pub async fn key_exists(&self, name: &str) -> Result<bool> {
        let conn = self.storage.get_connection().await;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM keys WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }
}

fn key_from_row(row: &Row<'_>) -> rusqlite::Result<KeyData> {
    let network_str: String = row.get(2)?;
    let network = match network_str.as_str() {
        "bitcoin" => Network::Bitcoin,
        "testnet" => Network::Testnet,
        "signet" => Network::Signet,
        _ => Network::Regtest,
    };

    Ok(KeyData {
        id: row.get(0)?,
        name: row.get(1)?,
        network,
        address: row.get(3)?,
        created_at: chrono::DateTime::from_timestamp(row.get(4)?, 0).unwrap_or_else(Utc::now),
        mnemonic: row.get(5)?,
    })
}
