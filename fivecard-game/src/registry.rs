use crate::cards::PublicCards;
use crate::commitment::{check_ciphertext, resolve_attestation, Submission};
use crate::error::{GameError, Result};
use crate::escrow::{Payee, Release, StakeEscrow};
use crate::events::GameEvent;
use crate::game::{Game, GameInfo};
use crate::seat::Selection;
use crate::settlement::settle;
use crate::types::GameId;
use fivecard_core::{Address, Amount, CiphertextHandle, CiphertextVerifier, Network};
use std::collections::HashSet;

/// What a successful operation did, for the host to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub game: GameId,
    pub events: Vec<GameEvent>,
    pub releases: Vec<Release>,
}

impl Receipt {
    fn new(game: GameId) -> Self {
        Self {
            game,
            events: Vec::new(),
            releases: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameFilter {
    All,
    /// Still waiting for a second player.
    Open,
    Involving(Address),
}

impl GameFilter {
    pub fn matches(&self, game: &Game) -> bool {
        match self {
            Self::All => true,
            Self::Open => game.player2().is_none() && !game.claimed(),
            Self::Involving(address) => game.involves(address),
        }
    }
}

/// Every game ever created, indexed by `id - 1`.
///
/// Each operation validates everything before it touches any state, so a
/// rejected call leaves the registry exactly as it was.
#[derive(Debug)]
pub struct GameRegistry {
    games: Vec<Game>,
    escrow: StakeEscrow,
    /// Every handle ever recorded as a selection, in any game.
    used_handles: HashSet<CiphertextHandle>,
    network: Network,
}

impl GameRegistry {
    pub fn new(network: Network) -> Self {
        Self {
            games: Vec::new(),
            escrow: StakeEscrow::default(),
            used_handles: HashSet::new(),
            network,
        }
    }

    /// Restore from stored games, which must be exactly ids `1..=n`.
    pub fn from_games(network: Network, mut games: Vec<Game>) -> Result<Self> {
        games.sort_by_key(|g| g.id());
        for (index, game) in games.iter().enumerate() {
            let expected = GameId::new(index as u64 + 1);
            if game.id() != expected {
                return Err(GameError::Core(fivecard_core::CoreError::internal(format!(
                    "Stored games are not contiguous: expected {}, found {}",
                    expected,
                    game.id()
                ))));
            }
        }

        let escrow = StakeEscrow::rebuild(&games);
        let used_handles = games
            .iter()
            .flat_map(|g| {
                let (first, second) = g.selections();
                first.into_iter().chain(second)
            })
            .collect();
        tracing::debug!(
            "Restored {} games, {} in escrow",
            games.len(),
            escrow.total()
        );
        Ok(Self {
            games,
            escrow,
            used_handles,
            network,
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// The id the next successful create receives.
    pub fn next_game_id(&self) -> GameId {
        GameId::new(self.games.len() as u64 + 1)
    }

    pub fn get_game(&self, id: GameId) -> Result<&Game> {
        id.get()
            .checked_sub(1)
            .and_then(|index| self.games.get(index as usize))
            .ok_or(GameError::NotFound(id))
    }

    fn game_mut(&mut self, id: GameId) -> Result<&mut Game> {
        id.get()
            .checked_sub(1)
            .and_then(|index| self.games.get_mut(index as usize))
            .ok_or(GameError::NotFound(id))
    }

    pub fn game_info(&self, id: GameId) -> Result<GameInfo> {
        Ok(self.get_game(id)?.info())
    }

    pub fn get_selections(
        &self,
        id: GameId,
    ) -> Result<(Option<CiphertextHandle>, Option<CiphertextHandle>)> {
        Ok(self.get_game(id)?.selections())
    }

    pub fn list_games(&self, filter: &GameFilter) -> Vec<&Game> {
        self.games.iter().filter(|g| filter.matches(g)).collect()
    }

    pub fn escrow(&self) -> &StakeEscrow {
        &self.escrow
    }

    pub fn create_game(
        &mut self,
        caller: &Address,
        value: Amount,
        entropy: &[u8; 32],
    ) -> Result<Receipt> {
        self.escrow.check_stake(value)?;

        let id = self.next_game_id();
        let cards = PublicCards::draw(entropy, id);
        self.escrow.lock(id, caller, value)?;
        self.games.push(Game::new(id, caller.clone(), cards));

        let mut receipt = Receipt::new(id);
        receipt.events.push(GameEvent::GameCreated {
            game: id,
            player1: caller.clone(),
            stake: value,
            cards,
        });
        self.finish_op(id, &mut receipt)?;

        tracing::info!("Game {} created by {} with cards {}", id, caller, cards);
        Ok(receipt)
    }

    pub fn join_game(&mut self, caller: &Address, id: GameId, value: Amount) -> Result<Receipt> {
        self.get_game(id)?.check_join(caller)?;
        self.escrow.check_stake(value)?;

        self.escrow.lock(id, caller, value)?;
        self.game_mut(id)?.seat_player2(caller.clone(), value);

        let mut receipt = Receipt::new(id);
        receipt.events.push(GameEvent::GameJoined {
            game: id,
            player2: caller.clone(),
            stake: value,
        });
        self.finish_op(id, &mut receipt)?;

        tracing::info!("{} joined game {}", caller, id);
        Ok(receipt)
    }

    pub fn submit_selection(
        &mut self,
        caller: &Address,
        id: GameId,
        submission: &Submission,
        verifier: &dyn CiphertextVerifier,
    ) -> Result<Receipt> {
        let game = self.get_game(id)?;
        game.check_selecting()?;
        check_ciphertext(verifier, id, submission, caller)?;
        let seat = game.check_selector(caller)?;
        if self.used_handles.contains(&submission.handle) {
            tracing::debug!(
                "Handle {} already used as a selection, rejected in game {}",
                submission.handle,
                id
            );
            return Err(GameError::InvalidCiphertext(id));
        }
        let attested_by =
            resolve_attestation(id, game.public_cards(), submission, caller, self.network)?;

        self.game_mut(id)?.record_selection(
            seat,
            Selection {
                handle: submission.handle,
                attested_by,
            },
        );
        self.used_handles.insert(submission.handle);

        let mut receipt = Receipt::new(id);
        receipt.events.push(GameEvent::SelectionSubmitted {
            game: id,
            player: caller.clone(),
            handle: submission.handle,
        });
        self.finish_op(id, &mut receipt)?;

        tracing::info!("{} submitted a selection in game {}", caller, id);
        Ok(receipt)
    }

    /// Anyone may claim; the cleartext choices are trusted as given.
    pub fn claim(
        &mut self,
        caller: &Address,
        id: GameId,
        choice1: u8,
        choice2: u8,
    ) -> Result<Receipt> {
        let index = self.get_game(id)?.id().get() as usize - 1;
        let game = &mut self.games[index];
        let settlement = settle(game, &mut self.escrow, choice1, choice2)?;

        let (amount, burned) = match &settlement.release.payee {
            Payee::Player(_) => (settlement.release.amount, Amount::ZERO),
            Payee::Burn => (Amount::ZERO, settlement.release.amount),
        };

        let mut receipt = Receipt::new(id);
        receipt.events.push(GameEvent::Claimed {
            game: id,
            winner: settlement.winner,
            amount,
            burned,
        });
        receipt.releases.push(settlement.release);
        self.finish_op(id, &mut receipt)?;

        tracing::info!("Game {} claimed by {}", id, caller);
        Ok(receipt)
    }

    /// End-of-operation guard: opens a game whose selections are complete.
    fn finish_op(&mut self, id: GameId, receipt: &mut Receipt) -> Result<()> {
        let game = self.game_mut(id)?;
        if !game.advance_if_ready() {
            return Ok(());
        }

        let (Some(selection1), Some(selection2)) = game.selections() else {
            return Ok(());
        };
        let Some(player2) = game.player2().cloned() else {
            return Ok(());
        };
        receipt.events.push(GameEvent::Opened {
            game: id,
            player1: game.player1().clone(),
            player2,
            selection1,
            selection2,
        });
        Ok(())
    }
}
