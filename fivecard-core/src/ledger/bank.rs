use crate::error::{CoreError, Result};
use crate::storage::{write_meta, AccountStore, Storage};
use crate::types::{AccountInfo, Address};
use bitcoin::Amount;
use rusqlite::Connection;
use std::collections::{BTreeSet, HashMap};

const BURNED_KEY: &str = "burned_total";
const MINTED_KEY: &str = "minted_total";

/// In-memory balances and nonces, mirrored to the `accounts` table.
///
/// Mutations only touch memory and remember which rows changed; the host
/// writes them with [`Bank::persist`] inside its own sqlite transaction.
#[derive(Debug, Default)]
pub struct Bank {
    accounts: HashMap<Address, AccountInfo>,
    burned: Amount,
    minted: Amount,
    dirty: BTreeSet<Address>,
    totals_dirty: bool,
}

impl Bank {
    pub async fn load(storage: &Storage) -> Result<Self> {
        let accounts = AccountStore::new(storage).load_accounts().await?;
        let burned = load_total(storage, BURNED_KEY).await?;
        let minted = load_total(storage, MINTED_KEY).await?;

        tracing::debug!("Loaded {} accounts, {} burned", accounts.len(), burned);
        Ok(Self {
            accounts: accounts
                .into_iter()
                .map(|a| (a.address.clone(), a))
                .collect(),
            burned,
            minted,
            dirty: BTreeSet::new(),
            totals_dirty: false,
        })
    }

    pub fn account(&self, address: &Address) -> AccountInfo {
        self.accounts
            .get(address)
            .cloned()
            .unwrap_or_else(|| AccountInfo::empty(address.clone()))
    }

    pub fn balance(&self, address: &Address) -> Amount {
        self.accounts
            .get(address)
            .map(|a| a.balance)
            .unwrap_or(Amount::ZERO)
    }

    pub fn nonce(&self, address: &Address) -> u64 {
        self.accounts.get(address).map(|a| a.nonce).unwrap_or(0)
    }

    pub fn burned(&self) -> Amount {
        self.burned
    }

    /// Everything ever created by the faucet.
    pub fn minted(&self) -> Amount {
        self.minted
    }

    /// Sum of all spendable balances.
    pub fn total_balance(&self) -> Amount {
        self.accounts.values().map(|a| a.balance).sum()
    }

    pub fn check_nonce(&self, address: &Address, nonce: u64) -> Result<()> {
        let expected = self.nonce(address);
        if nonce != expected {
            return Err(CoreError::BadNonce {
                expected,
                got: nonce,
            });
        }
        Ok(())
    }

    pub fn check_funds(&self, address: &Address, amount: Amount) -> Result<()> {
        let available = self.balance(address);
        if available < amount {
            return Err(CoreError::InsufficientFunds {
                need: amount.to_sat(),
                available: available.to_sat(),
            });
        }
        Ok(())
    }

    pub fn debit(&mut self, address: &Address, amount: Amount) -> Result<()> {
        self.check_funds(address, amount)?;
        let account = self.entry(address);
        account.balance -= amount;
        Ok(())
    }

    pub fn credit(&mut self, address: &Address, amount: Amount) {
        let account = self.entry(address);
        account.balance += amount;
    }

    pub fn burn(&mut self, amount: Amount) {
        self.burned += amount;
        self.totals_dirty = true;
    }

    /// Create new funds out of thin air. Only the dev faucet calls this.
    pub fn mint(&mut self, address: &Address, amount: Amount) {
        self.credit(address, amount);
        self.minted += amount;
        self.totals_dirty = true;
    }

    pub fn bump_nonce(&mut self, address: &Address) {
        let account = self.entry(address);
        account.nonce += 1;
    }

    /// Write every account touched since the last call.
    pub fn persist(&mut self, conn: &Connection) -> Result<()> {
        for address in &self.dirty {
            if let Some(account) = self.accounts.get(address) {
                AccountStore::save_account(conn, account)?;
            }
        }
        if self.totals_dirty {
            write_meta(conn, BURNED_KEY, &self.burned.to_sat().to_string())?;
            write_meta(conn, MINTED_KEY, &self.minted.to_sat().to_string())?;
        }
        self.dirty.clear();
        self.totals_dirty = false;
        Ok(())
    }

    fn entry(&mut self, address: &Address) -> &mut AccountInfo {
        self.dirty.insert(address.clone());
        self.accounts
            .entry(address.clone())
            .or_insert_with(|| AccountInfo::empty(address.clone()))
    }
}

async fn load_total(storage: &Storage, key: &str) -> Result<Amount> {
    match storage.get_meta(key).await? {
        Some(raw) => raw
            .parse::<u64>()
            .map(Amount::from_sat)
            .map_err(|e| CoreError::internal(format!("Corrupt {} '{}': {}", key, raw, e))),
        None => Ok(Amount::ZERO),
    }
}
