mod commands;

use clap::{Parser, Subcommand};
use commands::Context;
use fivecard_core::CoreError;
use fivecard_game::GameError;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fivecard")]
#[command(about = "FiveCard - stake-backed commit/reveal card duel")]
#[command(version)]
struct Cli {
    /// Data directory for keys and the ledger
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Player key management
    #[command(subcommand)]
    Key(commands::KeyCommands),

    /// Balances and the dev faucet
    #[command(subcommand)]
    Account(commands::AccountCommands),

    /// Create, join, select and claim games
    #[command(subcommand)]
    Game(commands::GameCommands),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "fivecard={},fivecard_game={},fivecard_core={}",
            log_level, log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = cli.data_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fivecard")
    });
    tokio::fs::create_dir_all(&data_dir).await?;

    let ctx = Context::open(&data_dir).await?;

    let result = match cli.command {
        Commands::Key(cmd) => commands::handle_key_command(cmd, &ctx).await,
        Commands::Account(cmd) => commands::handle_account_command(cmd, &ctx).await,
        Commands::Game(cmd) => commands::handle_game_command(cmd, &ctx).await,
    };

    if let Err(e) = result {
        match e {
            GameError::Core(CoreError::KeyNotFound { name }) => {
                eprintln!("Error: Key '{}' not found", name);
                eprintln!("Use 'fivecard key list' to see available keys");
            }
            GameError::Core(CoreError::InsufficientFunds { need, available }) => {
                eprintln!("Error: Insufficient funds");
                eprintln!("Need: {} sats, Available: {} sats", need, available);
                eprintln!("Use 'fivecard account fund <key>' on a dev network");
            }
            GameError::NotFound(id) => {
                eprintln!("Error: Game {} does not exist", id);
                eprintln!("Use 'fivecard game list' to see games");
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
