use crate::cards::PublicCards;
use crate::error::{GameError, Result};
use crate::seat::{Seat, Selection};
use crate::types::{GameId, GameStatus, STAKE};
use chrono::{DateTime, Utc};
use fivecard_core::{Address, Amount, CiphertextHandle};
use serde::{Deserialize, Serialize};

/// Which side of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatIndex {
    First,
    Second,
}

/// One two-player contest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    id: GameId,
    player1: Seat,
    player2: Option<Seat>,
    public_cards: PublicCards,
    status: GameStatus,
    winner: Option<Address>,
    claimed: bool,
    stake_total: Amount,
    created_at: DateTime<Utc>,
}

impl Game {
    pub(crate) fn new(id: GameId, player1: Address, public_cards: PublicCards) -> Self {
        Self {
            id,
            player1: Seat::new(player1),
            player2: None,
            public_cards,
            status: GameStatus::WaitingForPlayer,
            winner: None,
            claimed: false,
            stake_total: STAKE,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn player1(&self) -> &Address {
        self.player1.player()
    }

    pub fn player2(&self) -> Option<&Address> {
        self.player2.as_ref().map(|s| s.player())
    }

    pub fn public_cards(&self) -> &PublicCards {
        &self.public_cards
    }

    pub fn winner(&self) -> Option<&Address> {
        self.winner.as_ref()
    }

    pub fn claimed(&self) -> bool {
        self.claimed
    }

    pub fn stake_total(&self) -> Amount {
        self.stake_total
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn seat(&self, index: SeatIndex) -> Option<&Seat> {
        match index {
            SeatIndex::First => Some(&self.player1),
            SeatIndex::Second => self.player2.as_ref(),
        }
    }

    pub fn seat_of(&self, address: &Address) -> Option<SeatIndex> {
        if self.player1.is(address) {
            Some(SeatIndex::First)
        } else if self.player2.as_ref().is_some_and(|s| s.is(address)) {
            Some(SeatIndex::Second)
        } else {
            None
        }
    }

    pub fn involves(&self, address: &Address) -> bool {
        self.seat_of(address).is_some()
    }

    pub fn selections(&self) -> (Option<CiphertextHandle>, Option<CiphertextHandle>) {
        (
            self.player1.handle(),
            self.player2.as_ref().and_then(|s| s.handle()),
        )
    }

    /// Join checks in order: finished, full, own game. Stake is checked by
    /// the escrow afterwards.
    pub(crate) fn check_join(&self, caller: &Address) -> Result<()> {
        if self.status == GameStatus::Finished {
            return Err(GameError::invalid_state(self.id, "game is finished"));
        }
        if self.player2.is_some() {
            return Err(GameError::AlreadyFull(self.id));
        }
        if self.player1.is(caller) {
            return Err(GameError::SelfJoin(self.id));
        }
        if self.status != GameStatus::WaitingForPlayer {
            return Err(GameError::invalid_state(self.id, "not accepting players"));
        }
        Ok(())
    }

    pub(crate) fn seat_player2(&mut self, player2: Address, stake: Amount) {
        self.player2 = Some(Seat::new(player2));
        self.stake_total += stake;
        self.status = GameStatus::WaitingSelections;
    }

    pub(crate) fn check_selecting(&self) -> Result<()> {
        if self.status != GameStatus::WaitingSelections {
            return Err(GameError::invalid_state(
                self.id,
                format!("selections not accepted while {}", self.status),
            ));
        }
        Ok(())
    }

    /// Seat the caller may submit into, or why not.
    pub(crate) fn check_selector(&self, caller: &Address) -> Result<SeatIndex> {
        let index = self
            .seat_of(caller)
            .ok_or_else(|| GameError::NotAParticipant {
                game: self.id,
                address: caller.clone(),
            })?;

        let already = self.seat(index).is_some_and(|s| s.has_selected());
        if already {
            return Err(GameError::AlreadySubmitted {
                game: self.id,
                address: caller.clone(),
            });
        }
        Ok(index)
    }

    pub(crate) fn record_selection(&mut self, index: SeatIndex, selection: Selection) {
        match index {
            SeatIndex::First => self.player1.record(selection),
            SeatIndex::Second => {
                if let Some(seat) = self.player2.as_mut() {
                    seat.record(selection);
                }
            }
        }
    }

    /// Run at the end of every mutating operation: once both selections are
    /// in, a selecting game opens. Returns true when it just did.
    pub(crate) fn advance_if_ready(&mut self) -> bool {
        let both = matches!(self.selections(), (Some(_), Some(_)));
        if both && self.status == GameStatus::WaitingSelections {
            self.status = GameStatus::Opened;
            tracing::info!("Game {} opened", self.id);
            return true;
        }
        false
    }

    pub(crate) fn check_claimable(&self) -> Result<()> {
        if self.status != GameStatus::Opened {
            return Err(GameError::invalid_state(
                self.id,
                format!("cannot claim while {}", self.status),
            ));
        }
        if self.claimed {
            return Err(GameError::invalid_state(self.id, "already claimed"));
        }
        Ok(())
    }

    pub(crate) fn finish(&mut self, winner: Option<Address>) {
        self.winner = winner;
        self.claimed = true;
        self.stake_total = Amount::ZERO;
        self.status = GameStatus::Finished;
    }

    pub fn info(&self) -> GameInfo {
        let (selection1, selection2) = self.selections();
        GameInfo {
            id: self.id,
            player1: self.player1().clone(),
            player2: self.player2().cloned(),
            public_cards: self.public_cards,
            has_selection1: selection1.is_some(),
            has_selection2: selection2.is_some(),
            status: self.status,
            winner: self.winner.clone(),
            claimed: self.claimed,
            stake_total: self.stake_total,
        }
    }
}

/// Flat read view of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub id: GameId,
    pub player1: Address,
    pub player2: Option<Address>,
    pub public_cards: PublicCards,
    pub has_selection1: bool,
    pub has_selection2: bool,
    pub status: GameStatus,
    pub winner: Option<Address>,
    pub claimed: bool,
    pub stake_total: Amount,
}

impl GameInfo {
    pub fn status_ordinal(&self) -> u8 {
        self.status.ordinal()
    }
}
