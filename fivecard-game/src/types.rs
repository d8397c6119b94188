use fivecard_core::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-player stake, in satoshis.
pub const STAKE: Amount = Amount::from_sat(1);

/// What the winner takes: both stakes.
pub const POT: Amount = Amount::from_sat(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(u64);

impl GameId {
    pub const FIRST: GameId = GameId(1);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GameId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim_start_matches('#').parse().map(Self)
    }
}

/// Lifecycle of a game. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum GameStatus {
    WaitingForPlayer = 0,
    WaitingSelections = 1,
    Opened = 2,
    Finished = 3,
}

impl GameStatus {
    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::WaitingForPlayer => "waiting for player",
            Self::WaitingSelections => "waiting for selections",
            Self::Opened => "opened",
            Self::Finished => "finished",
        }
    }
}

impl TryFrom<u8> for GameStatus {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::WaitingForPlayer),
            1 => Ok(Self::WaitingSelections),
            2 => Ok(Self::Opened),
            3 => Ok(Self::Finished),
            other => Err(other),
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ordinals() {
        assert_eq!(GameStatus::WaitingForPlayer.ordinal(), 0);
        assert_eq!(GameStatus::WaitingSelections.ordinal(), 1);
        assert_eq!(GameStatus::Opened.ordinal(), 2);
        assert_eq!(GameStatus::Finished.ordinal(), 3);

        for ordinal in 0..4u8 {
            assert_eq!(GameStatus::try_from(ordinal).unwrap().ordinal(), ordinal);
        }
        assert_eq!(GameStatus::try_from(4), Err(4));
        assert!(GameStatus::WaitingForPlayer < GameStatus::Finished);
    }

    #[test]
    fn test_game_id_parse() {
        assert_eq!("7".parse::<GameId>().unwrap(), GameId::new(7));
        assert_eq!("#12".parse::<GameId>().unwrap(), GameId::new(12));
        assert!("x".parse::<GameId>().is_err());
        assert_eq!(GameId::FIRST.next(), GameId::new(2));
    }

    #[test]
    fn test_pot_is_two_stakes() {
        assert_eq!(STAKE * 2, POT);
    }
}
