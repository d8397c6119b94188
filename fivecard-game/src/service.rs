//! Single-process ledger host for the game engine.
//!
//! Transactions run one at a time behind an async mutex. A transaction is
//! authenticated from its signed envelope, checked against the sender's nonce
//! and balance, handed to the engine, and only then charged, paid out and
//! written to sqlite in a single database transaction.

use crate::commitment::Submission;
use crate::error::{GameError, Result};
use crate::escrow::Payee;
use crate::events::GameEvent;
use crate::game::{Game, GameInfo};
use crate::registry::{GameFilter, GameRegistry, Receipt};
use crate::store::{EventRecord, GameStore};
use crate::types::GameId;
use fivecard_core::crypto::sha256_concat;
use fivecard_core::storage::{read_meta, write_meta, AclStore};
use fivecard_core::{
    AccountInfo, Address, Amount, Bank, CiphertextHandle, CiphertextVerifier, CoreError, Envelope,
    LedgerConfig, Storage,
};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

const SEED_KEY: &str = "ledger_seed";
const SEQUENCE_KEY: &str = "ledger_sequence";

/// A state-changing request. `value` is what the sender attaches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GameCall {
    CreateGame {
        value: Amount,
    },
    JoinGame {
        game: GameId,
        value: Amount,
    },
    SubmitSelection {
        game: GameId,
        submission: Submission,
    },
    Claim {
        game: GameId,
        choice1: u8,
        choice2: u8,
    },
}

impl GameCall {
    pub fn value(&self) -> Amount {
        match self {
            Self::CreateGame { value } | Self::JoinGame { value, .. } => *value,
            Self::SubmitSelection { .. } | Self::Claim { .. } => Amount::ZERO,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateGame { .. } => "create_game",
            Self::JoinGame { .. } => "join_game",
            Self::SubmitSelection { .. } => "submit_selection",
            Self::Claim { .. } => "claim",
        }
    }
}

/// What the sender learns about an applied transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub game: GameId,
    pub sender: Address,
    pub nonce: u64,
    pub events: Vec<GameEvent>,
}

struct LedgerState {
    registry: GameRegistry,
    bank: Bank,
    seed: [u8; 32],
    sequence: u64,
    poisoned: Option<String>,
}

pub struct GameService {
    storage: Arc<Storage>,
    config: LedgerConfig,
    verifier: Arc<dyn CiphertextVerifier>,
    state: Mutex<LedgerState>,
}

impl GameService {
    /// Load games, balances and the ledger seed from `storage`.
    pub async fn open(
        storage: Arc<Storage>,
        config: LedgerConfig,
        verifier: Arc<dyn CiphertextVerifier>,
    ) -> Result<Self> {
        config.validate()?;

        let games = GameStore::new(&storage).load_games().await?;
        let registry = GameRegistry::from_games(config.network, games)?;
        let bank = Bank::load(&storage).await?;
        let (seed, sequence) = load_seed(&storage).await?;

        let supply = bank.total_balance() + registry.escrow().total() + bank.burned();
        if supply != bank.minted() {
            return Err(GameError::Core(CoreError::internal(format!(
                "Ledger does not balance: {} minted, {} accounted for",
                bank.minted(),
                supply
            ))));
        }

        tracing::info!(
            "Ledger open on {}: {} games, {} in escrow, {} burned",
            config.network,
            registry.next_game_id().get() - 1,
            registry.escrow().total(),
            bank.burned()
        );

        Ok(Self {
            storage,
            config,
            verifier,
            state: Mutex::new(LedgerState {
                registry,
                bank,
                seed,
                sequence,
                poisoned: None,
            }),
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Apply one signed call. A rejected call changes nothing: no debit, no
    /// nonce bump, no event.
    pub async fn execute(&self, envelope: Envelope<GameCall>) -> Result<TxReceipt> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        if let Some(reason) = &state.poisoned {
            return Err(GameError::Poisoned(reason.clone()));
        }

        let sender = envelope.verify(self.config.network)?;
        let call = &envelope.call;
        let value = call.value();
        state.bank.check_nonce(&sender, envelope.nonce)?;
        state.bank.check_funds(&sender, value)?;

        let result = match call {
            GameCall::CreateGame { value } => {
                let entropy =
                    create_entropy(&state.seed, state.sequence, state.registry.next_game_id());
                state.registry.create_game(&sender, *value, &entropy)
            }
            GameCall::JoinGame { game, value } => state.registry.join_game(&sender, *game, *value),
            GameCall::SubmitSelection { game, submission } => state.registry.submit_selection(
                &sender,
                *game,
                submission,
                self.verifier.as_ref(),
            ),
            GameCall::Claim {
                game,
                choice1,
                choice2,
            } => state.registry.claim(&sender, *game, *choice1, *choice2),
        };
        let receipt = match result {
            Ok(receipt) => receipt,
            Err(e) if e.is_rejection() => {
                tracing::warn!("Rejected {} from {}: {}", call.name(), sender.short(), e);
                return Err(e);
            }
            Err(e) => {
                tracing::error!("{} from {} failed: {}", call.name(), sender.short(), e);
                return Err(e);
            }
        };

        if let Err(e) = self.apply(state, &sender, value, &receipt).await {
            let reason = format!("{} from {} not persisted: {}", call.name(), sender, e);
            tracing::error!("{}", reason);
            state.poisoned = Some(reason);
            return Err(e);
        }

        Ok(TxReceipt {
            game: receipt.game,
            sender,
            nonce: envelope.nonce,
            events: receipt.events,
        })
    }

    /// Charge, pay out, bump the nonce and write everything in one sqlite
    /// transaction.
    async fn apply(
        &self,
        state: &mut LedgerState,
        sender: &Address,
        value: Amount,
        receipt: &Receipt,
    ) -> Result<()> {
        state.bank.debit(sender, value)?;
        for release in &receipt.releases {
            match &release.payee {
                Payee::Player(winner) => state.bank.credit(winner, release.amount),
                Payee::Burn => state.bank.burn(release.amount),
            }
        }
        state.bank.bump_nonce(sender);
        state.sequence += 1;

        let game = state.registry.get_game(receipt.game)?.clone();
        let sequence = state.sequence;
        let bank = &mut state.bank;
        self.storage
            .transaction(|tx| {
                GameStore::save_game(tx, &game)?;
                for event in &receipt.events {
                    GameStore::append_event(tx, event)?;
                    for (handle, address) in event.grants() {
                        AclStore::grant(tx, &handle.to_hex(), &address)?;
                    }
                }
                bank.persist(tx)?;
                write_meta(tx, SEQUENCE_KEY, &sequence.to_string())
            })
            .await?;

        Ok(())
    }

    /// Dev faucet: mint `amount` into `address`.
    pub async fn faucet(&self, address: &Address, amount: Amount) -> Result<AccountInfo> {
        if !self.config.faucet_enabled {
            return Err(GameError::Faucet("faucet is disabled".to_string()));
        }
        if amount == Amount::ZERO || amount > self.config.faucet_max {
            return Err(GameError::Faucet(format!(
                "amount must be between 1 and {} sat",
                self.config.faucet_max.to_sat()
            )));
        }

        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        if let Some(reason) = &state.poisoned {
            return Err(GameError::Poisoned(reason.clone()));
        }

        state.bank.mint(address, amount);
        let bank = &mut state.bank;
        if let Err(e) = self.storage.transaction(|tx| bank.persist(tx)).await {
            let reason = format!("faucet for {} not persisted: {}", address, e);
            tracing::error!("{}", reason);
            state.poisoned = Some(reason);
            return Err(e.into());
        }

        tracing::info!("Faucet sent {} to {}", amount, address);
        Ok(state.bank.account(address))
    }

    pub async fn get_game(&self, id: GameId) -> Result<Game> {
        let state = self.state.lock().await;
        Ok(state.registry.get_game(id)?.clone())
    }

    pub async fn game_info(&self, id: GameId) -> Result<GameInfo> {
        self.state.lock().await.registry.game_info(id)
    }

    pub async fn get_selections(
        &self,
        id: GameId,
    ) -> Result<(Option<CiphertextHandle>, Option<CiphertextHandle>)> {
        self.state.lock().await.registry.get_selections(id)
    }

    pub async fn next_game_id(&self) -> GameId {
        self.state.lock().await.registry.next_game_id()
    }

    pub async fn list_games(&self, filter: &GameFilter) -> Vec<GameInfo> {
        let state = self.state.lock().await;
        state
            .registry
            .list_games(filter)
            .into_iter()
            .map(|g| g.info())
            .collect()
    }

    pub async fn account(&self, address: &Address) -> AccountInfo {
        self.state.lock().await.bank.account(address)
    }

    pub async fn burned(&self) -> Amount {
        self.state.lock().await.bank.burned()
    }

    pub async fn escrow_total(&self) -> Amount {
        self.state.lock().await.registry.escrow().total()
    }

    pub async fn events(&self, game: Option<GameId>) -> Result<Vec<EventRecord>> {
        Ok(GameStore::new(&self.storage).load_events(game).await?)
    }

    pub async fn is_poisoned(&self) -> bool {
        self.state.lock().await.poisoned.is_some()
    }
}

/// Per-create randomness: `SHA-256(seed || sequence || game id)`.
fn create_entropy(seed: &[u8; 32], sequence: u64, game: GameId) -> [u8; 32] {
    sha256_concat(&[
        seed.as_slice(),
        &sequence.to_be_bytes(),
        &game.to_be_bytes(),
    ])
}

async fn load_seed(storage: &Storage) -> Result<([u8; 32], u64)> {
    let conn = storage.get_connection().await;

    let seed: [u8; 32] = match read_meta(&conn, SEED_KEY)? {
        Some(raw) => {
            let bytes = hex::decode(&raw)
                .map_err(|e| CoreError::internal(format!("Corrupt ledger seed: {}", e)))?;
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| CoreError::internal("Ledger seed must be 32 bytes"))?
        }
        None => {
            let mut seed = [0u8; 32];
            OsRng.fill_bytes(&mut seed);
            write_meta(&conn, SEED_KEY, &hex::encode(seed))?;
            seed
        }
    };

    let sequence: u64 = match read_meta(&conn, SEQUENCE_KEY)? {
        Some(raw) => raw
            .parse()
            .map_err(|e| CoreError::internal(format!("Corrupt ledger sequence: {}", e)))?,
        None => 0,
    };

    Ok((seed, sequence))
}
