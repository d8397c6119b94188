pub mod account;
pub mod game;
pub mod key;

pub use account::{handle_account_command, AccountCommands};
pub use game::{handle_game_command, GameCommands};
pub use key::{handle_key_command, KeyCommands};

use fivecard_core::{
    open_storage, Envelope, KeyManager, LedgerConfig, LocalOracle, Network, PlayerKey,
};
use fivecard_game::{GameCall, GameService, Result, TxReceipt};
use std::path::Path;
use std::sync::Arc;

/// Everything a command needs, opened once per invocation.
pub struct Context {
    pub keys: KeyManager,
    pub oracle: Arc<LocalOracle>,
    pub service: GameService,
}

impl Context {
    pub async fn open(data_dir: &Path) -> Result<Self> {
        let config = LedgerConfig::load(data_dir)?;
        let storage = open_storage(data_dir).await?;
        let oracle = Arc::new(LocalOracle::open(storage.clone(), config.network).await?);
        let keys = KeyManager::new(storage.clone(), config.network);
        let service = GameService::open(storage, config, oracle.clone()).await?;

        Ok(Self {
            keys,
            oracle,
            service,
        })
    }

    pub fn network(&self) -> Network {
        self.service.config().network
    }

    /// Sign `call` with the key's next nonce and run it.
    pub async fn send(&self, key: &PlayerKey, call: GameCall) -> Result<TxReceipt> {
        let nonce = self.service.account(&key.address()).await.nonce;
        let envelope = Envelope::sign(key, nonce, call)?;
        self.service.execute(envelope).await
    }
}

pub(crate) fn print_receipt(receipt: &TxReceipt) {
    for event in &receipt.events {
        println!("  {}", event);
    }
}
