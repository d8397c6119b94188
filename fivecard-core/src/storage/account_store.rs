use crate::error::Result;
use crate::storage::Storage;
use crate::types::{AccountInfo, Address};
use bitcoin::Amount;
use chrono::Utc;
use rusqlite::{params, Connection};

pub struct AccountStore<'a> {
    storage: &'a Storage,
}

impl<'a> AccountStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn load_accounts(&self) -> Result<Vec<AccountInfo>> {
        let conn = self.storage.get_connection().await;

        let mut stmt =
            conn.prepare("SELECT address, balance, nonce FROM accounts ORDER BY address ASC")?;

        let account_iter = stmt.query_map([], |row| {
            let address: String = row.get(0)?;
            let balance: i64 = row.get(1)?;
            let nonce: i64 = row.get(2)?;

            Ok(AccountInfo {
                address: Address::from_stored(address),
                balance: Amount::from_sat(balance as u64),
                nonce: nonce as u64,
            })
        })?;

        let mut accounts = Vec::new();
        for account in account_iter {
            accounts.push(account?);
        }

        Ok(accounts)
    }

    /// Insert or overwrite one account row. Takes a bare connection so it can
    /// run inside a caller's transaction.
    pub fn save_account(conn: &Connection, account: &AccountInfo) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO accounts (address, balance, nonce, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                account.address.as_str(),
                account.balance.to_sat() as i64,
                account.nonce as i64,
                Utc::now().timestamp(),
            ],
        )?;
        Ok(())
    }
}
