use crate::cards::PublicCards;
use crate::types::GameId;
use fivecard_core::{Address, Amount, CiphertextHandle};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum GameEvent {
    GameCreated {
        game: GameId,
        player1: Address,
        stake: Amount,
        cards: PublicCards,
    },
    GameJoined {
        game: GameId,
        player2: Address,
        stake: Amount,
    },
    SelectionSubmitted {
        game: GameId,
        player: Address,
        handle: CiphertextHandle,
    },
    Opened {
        game: GameId,
        player1: Address,
        player2: Address,
        selection1: CiphertextHandle,
        selection2: CiphertextHandle,
    },
    /// `winner` is `None` and `amount` zero on a tie; the pot went to `burned`.
    Claimed {
        game: GameId,
        winner: Option<Address>,
        amount: Amount,
        burned: Amount,
    },
}

impl GameEvent {
    pub fn game(&self) -> GameId {
        match self {
            Self::GameCreated { game, .. }
            | Self::GameJoined { game, .. }
            | Self::SelectionSubmitted { game, .. }
            | Self::Opened { game, .. }
            | Self::Claimed { game, .. } => *game,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::GameCreated { .. } => "GameCreated",
            Self::GameJoined { .. } => "GameJoined",
            Self::SelectionSubmitted { .. } => "SelectionSubmitted",
            Self::Opened { .. } => "Opened",
            Self::Claimed { .. } => "Claimed",
        }
    }

    /// Decryption grants this event implies: `(handle, address)` pairs.
    pub fn grants(&self) -> Vec<(CiphertextHandle, Address)> {
        match self {
            Self::SelectionSubmitted { player, handle, .. } => vec![(*handle, player.clone())],
            Self::Opened {
                player1,
                player2,
                selection1,
                selection2,
                ..
            } => [selection1, selection2]
                .into_iter()
                .flat_map(|h| [(*h, player1.clone()), (*h, player2.clone())])
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GameCreated {
                game,
                player1,
                stake,
                cards,
            } => write!(
                f,
                "game {} created by {} (stake {}, cards {})",
                game,
                player1.short(),
                stake,
                cards
            ),
            Self::GameJoined {
                game,
                player2,
                stake,
            } => write!(f, "{} joined game {} (stake {})", player2.short(), game, stake),
            Self::SelectionSubmitted {
                game,
                player,
                handle,
            } => write!(
                f,
                "{} selected in game {} ({})",
                player.short(),
                game,
                handle
            ),
            Self::Opened { game, .. } => write!(f, "game {} opened", game),
            Self::Claimed {
                game,
                winner: Some(winner),
                amount,
                ..
            } => write!(f, "game {} won by {}: {} paid", game, winner.short(), amount),
            Self::Claimed {
                game, burned, ..
            } => write!(f, "game {} tied: {} burned", game, burned),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_is_tagged() {
        let event = GameEvent::Claimed {
            game: GameId::new(4),
            winner: None,
            amount: Amount::ZERO,
            burned: Amount::from_sat(2),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "Claimed");
        assert_eq!(json["game"], 4);
        assert_eq!(event.kind(), "Claimed");
        assert_eq!(event.game(), GameId::new(4));
    }

    #[test]
    fn test_opened_grants_both_players_both_handles() {
        let p1 = Address::from_stored("bcrt1qone".to_string());
        let p2 = Address::from_stored("bcrt1qtwo".to_string());
        let h1 = CiphertextHandle::from_bytes([1; 32]);
        let h2 = CiphertextHandle::from_bytes([2; 32]);

        let grants = GameEvent::Opened {
            game: GameId::new(1),
            player1: p1.clone(),
            player2: p2.clone(),
            selection1: h1,
            selection2: h2,
        }
        .grants();

        assert_eq!(grants.len(), 4);
        assert!(grants.contains(&(h1, p2.clone())));
        assert!(grants.contains(&(h2, p1)));
    }
}
