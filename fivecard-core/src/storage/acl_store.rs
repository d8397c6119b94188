use crate::error::Result;
use crate::storage::Storage;
use crate::types::Address;
use chrono::Utc;
use rusqlite::{params, Connection};

/// Who may ask the decryption oracle for which ciphertext handle.
pub struct AclStore<'a> {
    storage: &'a Storage,
}

impl<'a> AclStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn is_allowed(&self, handle_hex: &str, address: &Address) -> Result<bool> {
        let conn = self.storage.get_connection().await;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM acl WHERE handle = ?1 AND address = ?2",
            params![handle_hex, address.as_str()],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    pub async fn allowed_addresses(&self, handle_hex: &str) -> Result<Vec<Address>> {
        let conn = self.storage.get_connection().await;

        let mut stmt =
            conn.prepare("SELECT address FROM acl WHERE handle = ?1 ORDER BY granted_at ASC")?;
        let iter = stmt.query_map(params![handle_hex], |row| {
            let address: String = row.get(0)?;
            Ok(Address::from_stored(address))
        })?;

        let mut addresses = Vec::new();
        for address in iter {
            addresses.push(address?);
        }
        Ok(addresses)
    }

    /// Grant is idempotent; re-granting keeps the original timestamp.
    pub fn grant(conn: &Connection, handle_hex: &str, address: &Address) -> Result<()> {
        conn.execute(
            "INSERT OR IGNORE INTO acl (handle, address, granted_at) VALUES (?1, ?2, ?3)",
            params![handle_hex, address.as_str(), Utc::now().timestamp()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_grant_and_check() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(&dir.path().join("ledger.db")).await.unwrap();
        let alice = Address::from_stored("bcrt1qalice".to_string());
        let bob = Address::from_stored("bcrt1qbob".to_string());

        storage
            .transaction(|tx| {
                AclStore::grant(tx, "aa", &alice)?;
                AclStore::grant(tx, "aa", &alice)
            })
            .await
            .unwrap();

        let acl = AclStore::new(&storage);
        assert!(acl.is_allowed("aa", &alice).await.unwrap());
        assert!(!acl.is_allowed("aa", &bob).await.unwrap());
        assert!(!acl.is_allowed("bb", &alice).await.unwrap());
        assert_eq!(acl.allowed_addresses("aa").await.unwrap(), vec![alice]);
    }
}
