use crate::types::GameId;
use fivecard_core::{Address, Amount};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("FiveCard core error: {0}")]
    Core(#[from] fivecard_core::CoreError),

    #[error("Game {0} not found")]
    NotFound(GameId),

    #[error("Game {0} already has two players")]
    AlreadyFull(GameId),

    #[error("Cannot join your own game {0}")]
    SelfJoin(GameId),

    #[error("Wrong stake: expected {expected}, got {got}")]
    WrongStake { expected: Amount, got: Amount },

    #[error("{address} is not playing in game {game}")]
    NotAParticipant { game: GameId, address: Address },

    #[error("{address} already submitted a selection in game {game}")]
    AlreadySubmitted { game: GameId, address: Address },

    #[error("Ciphertext proof rejected for game {0}")]
    InvalidCiphertext(GameId),

    #[error("Selection signature does not match caller in game {0}")]
    BadSignature(GameId),

    #[error("Invalid state for game {game}: {reason}")]
    InvalidState { game: GameId, reason: String },

    #[error("Faucet error: {0}")]
    Faucet(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Ledger halted after a failed write: {0}")]
    Poisoned(String),
}

impl GameError {
    pub fn invalid_state(game: GameId, reason: impl Into<String>) -> Self {
        Self::InvalidState {
            game,
            reason: reason.into(),
        }
    }

    /// True for the engine's own rejections, which never leave an effect.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::AlreadyFull(_)
                | Self::SelfJoin(_)
                | Self::WrongStake { .. }
                | Self::NotAParticipant { .. }
                | Self::AlreadySubmitted { .. }
                | Self::InvalidCiphertext(_)
                | Self::BadSignature(_)
                | Self::InvalidState { .. }
        )
    }
}
