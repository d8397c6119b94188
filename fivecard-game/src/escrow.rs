use crate::error::{GameError, Result};
use crate::game::Game;
use crate::types::{GameId, STAKE};
use fivecard_core::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where released funds go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payee {
    Player(Address),
    Burn,
}

/// Instruction for the host to move escrowed funds out of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub game: GameId,
    pub payee: Payee,
    pub amount: Amount,
}

/// Funds locked per game. Only whole pots are released.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StakeEscrow {
    locked: BTreeMap<GameId, Amount>,
}

impl StakeEscrow {
    /// Rebuild from game records: every unclaimed game still holds its stake.
    pub fn rebuild<'a>(games: impl IntoIterator<Item = &'a Game>) -> Self {
        let locked = games
            .into_iter()
            .filter(|g| !g.claimed() && g.stake_total() > Amount::ZERO)
            .map(|g| (g.id(), g.stake_total()))
            .collect();
        Self { locked }
    }

    pub fn check_stake(&self, amount: Amount) -> Result<()> {
        if amount != STAKE {
            return Err(GameError::WrongStake {
                expected: STAKE,
                got: amount,
            });
        }
        Ok(())
    }

    pub fn lock(&mut self, game: GameId, payer: &Address, amount: Amount) -> Result<()> {
        self.check_stake(amount)?;
        *self.locked.entry(game).or_insert(Amount::ZERO) += amount;
        tracing::debug!("Locked {} from {} in game {}", amount, payer.short(), game);
        Ok(())
    }

    /// Move everything locked in `game` to `payee`. A second release finds
    /// nothing and fails.
    pub fn release(&mut self, game: GameId, payee: Payee) -> Result<Release> {
        let amount = self
            .locked
            .remove(&game)
            .ok_or_else(|| GameError::invalid_state(game, "nothing locked in escrow"))?;

        Ok(Release {
            game,
            payee,
            amount,
        })
    }

    pub fn locked(&self, game: GameId) -> Amount {
        self.locked.get(&game).copied().unwrap_or(Amount::ZERO)
    }

    pub fn total(&self) -> Amount {
        self.locked.values().copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::from_stored(s.to_string())
    }

    #[test]
    fn test_wrong_stake() {
        let mut escrow = StakeEscrow::default();
        for bad in [0, 2, 100] {
            let err = escrow
                .lock(GameId::new(1), &addr("a"), Amount::from_sat(bad))
                .unwrap_err();
            assert!(matches!(err, GameError::WrongStake { .. }));
        }
        assert_eq!(escrow.total(), Amount::ZERO);
    }

    #[test]
    fn test_release_once() {
        let mut escrow = StakeEscrow::default();
        let game = GameId::new(1);
        escrow.lock(game, &addr("a"), STAKE).unwrap();
        escrow.lock(game, &addr("b"), STAKE).unwrap();
        assert_eq!(escrow.locked(game), Amount::from_sat(2));

        let release = escrow.release(game, Payee::Player(addr("b"))).unwrap();
        assert_eq!(release.amount, Amount::from_sat(2));
        assert_eq!(release.payee, Payee::Player(addr("b")));
        assert_eq!(escrow.total(), Amount::ZERO);

        assert!(matches!(
            escrow.release(game, Payee::Burn).unwrap_err(),
            GameError::InvalidState { .. }
        ));
    }
}
