use crate::error::Result;
use crate::escrow::{Payee, Release, StakeEscrow};
use crate::game::Game;
use fivecard_core::Address;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Result of comparing the two revealed choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Player1,
    Player2,
    Tie,
}

/// Higher card takes the pot; equal cards burn it. Nothing else matters.
pub fn decide(choice1: u8, choice2: u8) -> Outcome {
    match choice1.cmp(&choice2) {
        Ordering::Greater => Outcome::Player1,
        Ordering::Less => Outcome::Player2,
        Ordering::Equal => Outcome::Tie,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub outcome: Outcome,
    pub winner: Option<Address>,
    pub release: Release,
}

/// Settle an opened game from the supplied cleartext choices.
///
/// The choices are taken as the faithful decryptions of the two handles and
/// are not checked against them.
pub fn settle(
    game: &mut Game,
    escrow: &mut StakeEscrow,
    choice1: u8,
    choice2: u8,
) -> Result<Settlement> {
    game.check_claimable()?;

    let outcome = decide(choice1, choice2);
    let winner = match outcome {
        Outcome::Player1 => Some(game.player1().clone()),
        Outcome::Player2 => game.player2().cloned(),
        Outcome::Tie => None,
    };
    let payee = match &winner {
        Some(address) => Payee::Player(address.clone()),
        None => Payee::Burn,
    };

    let release = escrow.release(game.id(), payee)?;
    game.finish(winner.clone());

    tracing::info!(
        "Game {} settled {} vs {}: {:?}, {} released",
        game.id(),
        choice1,
        choice2,
        outcome,
        release.amount
    );
    Ok(Settlement {
        outcome,
        winner,
        release,
    })
}
