pub mod account_store;
pub mod acl_store;
pub mod key_store;

pub use account_store::AccountStore;
pub use acl_store::AclStore;
pub use key_store::KeyStore;

use crate::error::{CoreError, Result};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use tokio::sync::Mutex;

pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    pub async fn new(db_path: &Path) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CoreError::internal(format!("Failed to create directory: {}", e)))?;
        }

        let conn = Connection::open(db_path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };

        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        // Player keys
        conn.execute(
            "CREATE TABLE IF NOT EXISTS keys (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                network TEXT NOT NULL,
                address TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                mnemonic BLOB NOT NULL
            )",
            [],
        )?;

        // Ledger accounts
        conn.execute(
            "CREATE TABLE IF NOT EXISTS accounts (
                address TEXT PRIMARY KEY,
                balance INTEGER NOT NULL,
                nonce INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        // Ledger-wide counters and seeds
        conn.execute(
            "CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        // Game records, one JSON document per game
        conn.execute(
            "CREATE TABLE IF NOT EXISTS games (
                id INTEGER PRIMARY KEY,
                status INTEGER NOT NULL,
                player1 TEXT NOT NULL,
                player2 TEXT,
                record TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        // Append-only event log
        conn.execute(
            "CREATE TABLE IF NOT EXISTS events (
                seq INTEGER PRIMARY KEY,
                game_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                payload TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        // Decryption grants
        conn.execute(
            "CREATE TABLE IF NOT EXISTS acl (
                handle TEXT NOT NULL,
                address TEXT NOT NULL,
                granted_at INTEGER NOT NULL,
                PRIMARY KEY (handle, address)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS events_by_game ON events (game_id, seq)",
            [],
        )?;

        Ok(())
    }

    pub async fn get_connection(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }

    /// Run `f` inside one sqlite transaction; commits only if `f` succeeds.
    pub async fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    pub async fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        read_meta(&conn, key)
    }

    pub async fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        write_meta(&conn, key, value)
    }
}

pub fn read_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

pub fn write_meta(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_meta_round_trip() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(&dir.path().join("ledger.db")).await.unwrap();

        assert_eq!(storage.get_meta("seed").await.unwrap(), None);
        storage.set_meta("seed", "abc").await.unwrap();
        storage.set_meta("seed", "def").await.unwrap();
        assert_eq!(storage.get_meta("seed").await.unwrap().as_deref(), Some("def"));
    }

    #[tokio::test]
    async fn test_failed_transaction_rolls_back() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(&dir.path().join("ledger.db")).await.unwrap();

        let result: Result<()> = storage
            .transaction(|tx| {
                write_meta(tx, "counter", "1")?;
                Err(CoreError::internal("boom"))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(storage.get_meta("counter").await.unwrap(), None);

        storage
            .transaction(|tx| write_meta(tx, "counter", "2"))
            .await
            .unwrap();
        assert_eq!(storage.get_meta("counter").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.db");

        let storage = Storage::new(&path).await.unwrap();
        storage.set_meta("k", "v").await.unwrap();
        drop(storage);

        let reopened = Storage::new(&path).await.unwrap();
        assert_eq!(reopened.get_meta("k").await.unwrap().as_deref(), Some("v"));
    }
}
