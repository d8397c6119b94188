use fivecard_core::{
    open_storage, DecryptionOracle, Envelope, KeyManager, LedgerConfig, LocalOracle, Network,
};
use fivecard_game::{GameCall, GameService, Submission, STAKE};
use std::sync::Arc;
use tempfile::tempdir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let temp_dir = tempdir()?;
    println!("Using temporary directory: {:?}", temp_dir.path());

    let storage = open_storage(temp_dir.path()).await?;
    let oracle = Arc::new(LocalOracle::open(storage.clone(), Network::Regtest).await?);
    let keys = KeyManager::new(storage.clone(), Network::Regtest);
    let service = GameService::open(storage, LedgerConfig::default(), oracle.clone()).await?;

    let (alice, _) = keys.create_key("alice").await?;
    let (bob, _) = keys.create_key("bob").await?;
    for key in [&alice, &bob] {
        service.faucet(&key.address(), STAKE).await?;
    }

    let created = service
        .execute(Envelope::sign(&alice, 0, GameCall::CreateGame { value: STAKE })?)
        .await?;
    let game = created.game;
    service
        .execute(Envelope::sign(&bob, 0, GameCall::JoinGame { game, value: STAKE })?)
        .await?;

    let cards = *service.get_game(game).await?.public_cards();
    println!("\nGame {} deals {}", game, cards);

    // alice plays low, bob plays high
    for (key, card) in [(&alice, cards.min()), (&bob, cards.max())] {
        let input = oracle.encrypt_input(card, &key.address())?;
        let submission = Submission::new(key, input, game, card);
        service
            .execute(Envelope::sign(
                key,
                1,
                GameCall::SubmitSelection { game, submission },
            )?)
            .await?;
    }

    let (Some(h1), Some(h2)) = service.get_selections(game).await? else {
        return Err("selections missing".into());
    };
    let choice1 = oracle.decrypt(&h1, &bob.decrypt_capability(&h1)).await?;
    let choice2 = oracle.decrypt(&h2, &bob.decrypt_capability(&h2)).await?;
    println!("Revealed: {} vs {}", choice1, choice2);

    let claimed = service
        .execute(Envelope::sign(
            &bob,
            2,
            GameCall::Claim {
                game,
                choice1,
                choice2,
            },
        )?)
        .await?;
    for event in &claimed.events {
        println!("{}", event);
    }

    println!("\nBalances:");
    for key in [&alice, &bob] {
        let account = service.account(&key.address()).await;
        println!("{}: {} sats", key.name(), account.balance.to_sat());
    }
    println!("Burned: {} sats", service.burned().await.to_sat());

    Ok(())
}
