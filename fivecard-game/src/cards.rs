use crate::types::GameId;
use fivecard_core::crypto::sha256_concat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const CARD_COUNT: usize = 5;
pub const MIN_CARD: u8 = 1;
pub const MAX_CARD: u8 = 13;

const DRAW_DOMAIN: &[u8] = b"fivecard/cards/v1";

/// The five face-up values of a game. Duplicates are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicCards([u8; CARD_COUNT]);

impl PublicCards {
    /// Draw five values from host entropy. The game id is mixed into the seed
    /// so repeated entropy still gives each game its own board.
    pub fn draw(entropy: &[u8; 32], game: GameId) -> Self {
        let seed = sha256_concat(&[DRAW_DOMAIN, entropy, &game.to_be_bytes()]);
        let mut rng = StdRng::from_seed(seed);

        let mut values = [0u8; CARD_COUNT];
        for value in values.iter_mut() {
            *value = rng.gen_range(MIN_CARD..=MAX_CARD);
        }
        Self(values)
    }

    pub fn values(&self) -> &[u8; CARD_COUNT] {
        &self.0
    }

    pub fn contains(&self, value: u8) -> bool {
        self.0.contains(&value)
    }

    /// Each value once, ascending.
    pub fn distinct(&self) -> Vec<u8> {
        let mut values = self.0.to_vec();
        values.sort_unstable();
        values.dedup();
        values
    }

    pub fn min(&self) -> u8 {
        self.0.iter().copied().min().unwrap_or(MIN_CARD)
    }

    pub fn max(&self) -> u8 {
        self.0.iter().copied().max().unwrap_or(MAX_CARD)
    }

    pub fn is_valid(&self) -> bool {
        self.0.iter().all(|v| (MIN_CARD..=MAX_CARD).contains(v))
    }
}

impl fmt::Display for PublicCards {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cards: Vec<String> = self.0.iter().map(|v| v.to_string()).collect();
        write!(f, "[{}]", cards.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_in_range() {
        for id in 1..200 {
            let cards = PublicCards::draw(&[id as u8; 32], GameId::new(id));
            assert_eq!(cards.values().len(), CARD_COUNT);
            assert!(cards.is_valid(), "{} out of range", cards);
        }
    }

    #[test]
    fn test_draw_is_deterministic() {
        let entropy = [42u8; 32];
        assert_eq!(
            PublicCards::draw(&entropy, GameId::new(3)),
            PublicCards::draw(&entropy, GameId::new(3))
        );
    }

    #[test]
    fn test_game_id_changes_board() {
        let entropy = [0u8; 32];
        let first = PublicCards::draw(&entropy, GameId::new(1));
        let differs = (2..20).any(|id| PublicCards::draw(&entropy, GameId::new(id)) != first);
        assert!(differs);
    }

    #[test]
    fn test_distinct_and_bounds() {
        let cards = PublicCards([5, 2, 5, 13, 2]);
        assert_eq!(cards.distinct(), vec![2, 5, 13]);
        assert_eq!(cards.min(), 2);
        assert_eq!(cards.max(), 13);
        assert!(cards.contains(13));
        assert!(!cards.contains(1));
        assert_eq!(cards.to_string(), "[5 2 5 13 2]");
    }
}
