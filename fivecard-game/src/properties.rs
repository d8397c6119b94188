//! Property tests over random operation sequences.
//!
//! Three players issue creates, joins, selections and claims in any order,
//! with wrong stakes, bad attestations and claims on games that are not
//! ready mixed in. After every step:
//!
//! 1. A rejected operation leaves every game and the escrow untouched.
//! 2. Status only moves forward and the dealt cards never change.
//! 3. `claimed` holds exactly when the game is finished.
//! 4. The escrow holds exactly the unclaimed stake of every game.

use crate::commitment::Submission;
use crate::escrow::StakeEscrow;
use crate::game::Game;
use crate::registry::{GameFilter, GameRegistry};
use crate::test_support::{fake_input, player, AcceptAll};
use crate::types::{GameId, GameStatus, POT};
use fivecard_core::{Amount, Network, PlayerKey};
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
enum Op {
    Create {
        who: usize,
        sats: u64,
        entropy: u8,
    },
    Join {
        who: usize,
        game: u64,
        sats: u64,
    },
    Submit {
        who: usize,
        game: u64,
        /// Index into the dealt cards, or an off-board value when >= 5.
        pick: usize,
        handle: u8,
    },
    Claim {
        who: usize,
        game: u64,
        choice1: u8,
        choice2: u8,
    },
}

fn arb_sats() -> impl Strategy<Value = u64> {
    prop_oneof![8 => Just(1u64), 1 => Just(0u64), 1 => 2u64..4]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..3, arb_sats(), any::<u8>())
            .prop_map(|(who, sats, entropy)| Op::Create { who, sats, entropy }),
        (0usize..3, 0u64..5, arb_sats()).prop_map(|(who, game, sats)| Op::Join { who, game, sats }),
        (0usize..3, 0u64..5, 0usize..6, any::<u8>()).prop_map(|(who, game, pick, handle)| {
            Op::Submit {
                who,
                game,
                pick,
                handle,
            }
        }),
        (0usize..3, 0u64..5, 1u8..=13, 1u8..=13).prop_map(|(who, game, choice1, choice2)| {
            Op::Claim {
                who,
                game,
                choice1,
                choice2,
            }
        }),
    ]
}

fn snapshot(registry: &GameRegistry) -> (Vec<Game>, StakeEscrow) {
    let games = registry
        .list_games(&GameFilter::All)
        .into_iter()
        .cloned()
        .collect();
    (games, registry.escrow().clone())
}

fn apply(registry: &mut GameRegistry, players: &[PlayerKey], op: &Op) -> bool {
    match op {
        Op::Create { who, sats, entropy } => registry
            .create_game(
                &players[*who].address(),
                Amount::from_sat(*sats),
                &[*entropy; 32],
            )
            .is_ok(),
        Op::Join { who, game, sats } => registry
            .join_game(
                &players[*who].address(),
                GameId::new(*game),
                Amount::from_sat(*sats),
            )
            .is_ok(),
        Op::Submit {
            who,
            game,
            pick,
            handle,
        } => {
            let id = GameId::new(*game);
            let choice = match registry.get_game(id) {
                Ok(g) if *pick < 5 => g.public_cards().values()[*pick],
                Ok(g) => (1..=13u8).find(|v| !g.public_cards().contains(*v)).unwrap_or(0),
                Err(_) => 7,
            };
            let key = &players[*who];
            let submission = Submission::new(key, fake_input(*handle), id, choice);
            registry
                .submit_selection(&key.address(), id, &submission, &AcceptAll)
                .is_ok()
        }
        Op::Claim {
            who,
            game,
            choice1,
            choice2,
        } => registry
            .claim(
                &players[*who].address(),
                GameId::new(*game),
                *choice1,
                *choice2,
            )
            .is_ok(),
    }
}

fn check_invariants(registry: &GameRegistry) -> Result<(), TestCaseError> {
    let games = registry.list_games(&GameFilter::All);

    let mut unclaimed = Amount::ZERO;
    for game in &games {
        prop_assert_eq!(game.claimed(), game.status() == GameStatus::Finished);
        prop_assert_eq!(registry.escrow().locked(game.id()), game.stake_total());
        prop_assert!(game.stake_total() <= POT);
        if let Some(winner) = game.winner() {
            prop_assert!(game.claimed());
            prop_assert!(game.involves(winner));
        }
        unclaimed += game.stake_total();
    }
    prop_assert_eq!(registry.escrow().total(), unclaimed);
    Ok(())
}

proptest! {
    #[test]
    fn prop_random_sequences_keep_invariants(ops in prop::collection::vec(arb_op(), 1..60)) {
        let players: Vec<PlayerKey> = (1..=3).map(player).collect();
        let mut registry = GameRegistry::new(Network::Regtest);
        let mut history: BTreeMap<GameId, (GameStatus, [u8; 5])> = BTreeMap::new();

        for op in &ops {
            let before = snapshot(&registry);
            let accepted = apply(&mut registry, &players, op);
            if !accepted {
                prop_assert_eq!(&snapshot(&registry), &before, "rejected {:?} changed state", op);
            }

            for game in registry.list_games(&GameFilter::All) {
                let cards = *game.public_cards().values();
                if let Some((status, dealt)) = history.get(&game.id()) {
                    prop_assert!(game.status() >= *status);
                    prop_assert_eq!(&cards, dealt);
                }
                history.insert(game.id(), (game.status(), cards));
            }
            check_invariants(&registry)?;
        }
    }

    #[test]
    fn prop_replay_is_deterministic(ops in prop::collection::vec(arb_op(), 1..40)) {
        let players: Vec<PlayerKey> = (1..=3).map(player).collect();
        let mut first = GameRegistry::new(Network::Regtest);
        let mut second = GameRegistry::new(Network::Regtest);

        for op in &ops {
            prop_assert_eq!(
                apply(&mut first, &players, op),
                apply(&mut second, &players, op)
            );
        }

        let strip = |games: Vec<Game>| -> Vec<_> {
            games.iter().map(|g| g.info()).collect()
        };
        prop_assert_eq!(strip(snapshot(&first).0), strip(snapshot(&second).0));
        prop_assert_eq!(snapshot(&first).1, snapshot(&second).1);
    }
}
