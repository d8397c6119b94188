use super::{print_receipt, Context};
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use fivecard_core::{Amount, CiphertextHandle, DecryptionOracle, PlayerKey};
use fivecard_game::{
    GameCall, GameError, GameFilter, GameId, GameInfo, GameStatus, Result, Submission, STAKE,
};

#[derive(Subcommand)]
pub enum GameCommands {
    /// Create a game and stake into it
    Create {
        /// Key name
        key: String,
        /// Stake in satoshis
        #[arg(short, long, default_value_t = STAKE.to_sat())]
        stake: u64,
    },
    /// Join an open game as the second player
    Join {
        /// Key name
        key: String,
        /// Game id
        game: GameId,
        /// Stake in satoshis
        #[arg(short, long, default_value_t = STAKE.to_sat())]
        stake: u64,
    },
    /// Encrypt and submit your card choice
    Select {
        /// Key name
        key: String,
        /// Game id
        game: GameId,
        /// One of the game's public card values
        card: u8,
    },
    /// Decrypt the selections this key may read
    Reveal {
        /// Key name
        key: String,
        /// Game id
        game: GameId,
    },
    /// Settle an opened game
    Claim {
        /// Key name
        key: String,
        /// Game id
        game: GameId,
        /// Player 1's card; decrypted with the key when omitted
        #[arg(long)]
        choice1: Option<u8>,
        /// Player 2's card; decrypted with the key when omitted
        #[arg(long)]
        choice2: Option<u8>,
    },
    /// Show one game
    Show {
        /// Game id
        game: GameId,
    },
    /// Show a game's ciphertext handles
    Selections {
        /// Game id
        game: GameId,
    },
    /// List games
    List {
        /// Only games still waiting for a second player
        #[arg(long)]
        open: bool,
        /// Only games involving this key
        #[arg(long)]
        key: Option<String>,
    },
    /// Show the event log
    Events {
        /// Only this game
        game: Option<GameId>,
    },
    /// The id the next created game receives
    NextId,
}

pub async fn handle_game_command(cmd: GameCommands, ctx: &Context) -> Result<()> {
    match cmd {
        GameCommands::Create { key, stake } => {
            let key = ctx.keys.load_key(&key).await?;
            let receipt = ctx
                .send(
                    &key,
                    GameCall::CreateGame {
                        value: Amount::from_sat(stake),
                    },
                )
                .await?;

            let info = ctx.service.game_info(receipt.game).await?;
            println!("Created game {}", info.id);
            println!("  Public cards: {}", info.public_cards);
            println!("Waiting for a second player:");
            println!("  fivecard game join <key> {}", info.id);
        }

        GameCommands::Join { key, game, stake } => {
            let key = ctx.keys.load_key(&key).await?;
            let receipt = ctx
                .send(
                    &key,
                    GameCall::JoinGame {
                        game,
                        value: Amount::from_sat(stake),
                    },
                )
                .await?;

            println!("Joined game {}", game);
            print_receipt(&receipt);
            let info = ctx.service.game_info(game).await?;
            println!("  Public cards: {}", info.public_cards);
        }

        GameCommands::Select { key, game, card } => {
            let key = ctx.keys.load_key(&key).await?;
            let input = ctx.oracle.encrypt_input(card, &key.address())?;
            let submission = Submission::new(&key, input, game, card);
            let receipt = ctx
                .send(&key, GameCall::SubmitSelection { game, submission })
                .await?;

            println!("Selection submitted to game {}", game);
            print_receipt(&receipt);
        }

        GameCommands::Reveal { key, game } => {
            let key = ctx.keys.load_key(&key).await?;
            let (selection1, selection2) = ctx.service.get_selections(game).await?;

            for (label, handle) in [("Player 1", selection1), ("Player 2", selection2)] {
                match handle {
                    None => println!("  {}: no selection yet", label),
                    Some(handle) => match decrypt(ctx, &key, &handle).await {
                        Ok(value) => println!("  {}: {}", label, value),
                        Err(e) => println!("  {}: hidden ({})", label, e),
                    },
                }
            }
        }

        GameCommands::Claim {
            key,
            game,
            choice1,
            choice2,
        } => {
            let key = ctx.keys.load_key(&key).await?;
            let (selection1, selection2) = ctx.service.get_selections(game).await?;

            let choice1 = match choice1 {
                Some(value) => value,
                None => decrypt_selection(ctx, &key, game, selection1).await?,
            };
            let choice2 = match choice2 {
                Some(value) => value,
                None => decrypt_selection(ctx, &key, game, selection2).await?,
            };

            let receipt = ctx
                .send(
                    &key,
                    GameCall::Claim {
                        game,
                        choice1,
                        choice2,
                    },
                )
                .await?;
            println!("Claimed game {} ({} vs {})", game, choice1, choice2);
            print_receipt(&receipt);
        }

        GameCommands::Show { game } => {
            let info = ctx.service.game_info(game).await?;

            println!("Game {}:", info.id);
            println!("  Status: {} ({})", info.status, info.status_ordinal());
            println!("  Public cards: {}", info.public_cards);
            println!("  Stake held: {} sats", info.stake_total.to_sat());
            match (&info.winner, info.status) {
                (Some(winner), _) => println!("  Winner: {}", winner),
                (None, GameStatus::Finished) => println!("  Winner: none (tie, pot burned)"),
                _ => {}
            }
            println!();

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Seat", "Address", "Selected"]);
            table.add_row(vec![
                "1".to_string(),
                info.player1.to_string(),
                info.has_selection1.to_string(),
            ]);
            if let Some(player2) = &info.player2 {
                table.add_row(vec![
                    "2".to_string(),
                    player2.to_string(),
                    info.has_selection2.to_string(),
                ]);
            }
            println!("{}", table);
        }

        GameCommands::Selections { game } => {
            let (selection1, selection2) = ctx.service.get_selections(game).await?;
            let show = |h: Option<CiphertextHandle>| {
                h.map(|h| h.to_hex()).unwrap_or_else(|| "-".to_string())
            };
            println!("Player 1: {}", show(selection1));
            println!("Player 2: {}", show(selection2));
        }

        GameCommands::List { open, key } => {
            let filter = match (open, key) {
                (true, _) => GameFilter::Open,
                (false, Some(key)) => {
                    GameFilter::Involving(ctx.keys.load_key(&key).await?.address())
                }
                (false, None) => GameFilter::All,
            };
            let games = ctx.service.list_games(&filter).await;
            if games.is_empty() {
                println!("No games.");
                return Ok(());
            }
            print_games(&games);
        }

        GameCommands::Events { game } => {
            let records = ctx.service.events(game).await?;
            if records.is_empty() {
                println!("No events.");
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Seq", "Game", "Kind", "Detail", "Time"]);
            for record in records {
                table.add_row(vec![
                    record.seq.to_string(),
                    record.event.game().to_string(),
                    record.event.kind().to_string(),
                    record.event.to_string(),
                    record.created_at.format("%H:%M:%S").to_string(),
                ]);
            }
            println!("{}", table);
        }

        GameCommands::NextId => {
            println!("{}", ctx.service.next_game_id().await);
        }
    }

    Ok(())
}

async fn decrypt(ctx: &Context, key: &PlayerKey, handle: &CiphertextHandle) -> Result<u8> {
    let capability = key.decrypt_capability(handle);
    Ok(ctx.oracle.decrypt(handle, &capability).await?)
}

async fn decrypt_selection(
    ctx: &Context,
    key: &PlayerKey,
    game: GameId,
    handle: Option<CiphertextHandle>,
) -> Result<u8> {
    let handle = handle.ok_or_else(|| GameError::invalid_state(game, "selection missing"))?;
    decrypt(ctx, key, &handle).await
}

fn print_games(games: &[GameInfo]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Game", "Status", "Cards", "Player 1", "Player 2", "Held"]);

    for info in games {
        table.add_row(vec![
            info.id.to_string(),
            info.status.to_string(),
            info.public_cards.to_string(),
            info.player1.short(),
            info.player2
                .as_ref()
                .map(|p| p.short())
                .unwrap_or_else(|| "-".to_string()),
            format!("{} sats", info.stake_total.to_sat()),
        ]);
    }
    println!("{}", table);
}
