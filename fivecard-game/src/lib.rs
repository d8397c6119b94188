//! Two-player commit/reveal card duel.
//!
//! Each game deals five public cards. Both players stake 1 sat, privately
//! pick one of the dealt values, and submit it encrypted together with a
//! signature binding the choice to the game. Once both selections are in the
//! game opens, and anyone holding the two decrypted values can claim it: the
//! higher card takes the 2 sat pot, a tie burns it.
//!
//! [`GameRegistry`] is the synchronous engine. [`GameService`] hosts it on a
//! sqlite-backed ledger with balances, nonces and an event log.

pub mod cards;
pub mod commitment;
pub mod error;
pub mod escrow;
pub mod events;
pub mod game;
pub mod registry;
pub mod seat;
pub mod service;
pub mod settlement;
pub mod store;
pub mod types;

#[cfg(test)]
mod properties;
#[cfg(test)]
mod test_support;

pub use cards::PublicCards;
pub use commitment::{selection_digest, Submission};
pub use error::{GameError, Result};
pub use escrow::{Payee, Release, StakeEscrow};
pub use events::GameEvent;
pub use game::{Game, GameInfo};
pub use registry::{GameFilter, GameRegistry, Receipt};
pub use service::{GameCall, GameService, TxReceipt};
pub use settlement::{decide, Outcome};
pub use store::{EventRecord, GameStore};
pub use types::{GameId, GameStatus, POT, STAKE};
