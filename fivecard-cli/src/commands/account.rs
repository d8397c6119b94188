use super::Context;
use clap::Subcommand;
use fivecard_core::{Address, Amount};
use fivecard_game::Result;

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Mint dev funds into a key's account
    Fund {
        /// Key name
        key: String,
        /// Amount in satoshis
        #[arg(default_value_t = 10)]
        amount: u64,
    },
    /// Show the balance of a key or an address
    Balance {
        /// Key name, or an address with --address
        target: String,
        /// Treat the target as an address
        #[arg(short, long)]
        address: bool,
    },
    /// Show ledger totals
    Supply,
}

pub async fn handle_account_command(cmd: AccountCommands, ctx: &Context) -> Result<()> {
    match cmd {
        AccountCommands::Fund { key, amount } => {
            let key = ctx.keys.load_key(&key).await?;
            let account = ctx
                .service
                .faucet(&key.address(), Amount::from_sat(amount))
                .await?;
            println!("Funded '{}' with {} sats", key.name(), amount);
            println!("  Balance: {} sats", account.balance.to_sat());
        }

        AccountCommands::Balance { target, address } => {
            let address = if address {
                Address::parse(&target, ctx.network())?
            } else {
                ctx.keys.load_key(&target).await?.address()
            };
            let account = ctx.service.account(&address).await;

            println!("Account {}:", account.address);
            println!("  Balance: {} sats", account.balance.to_sat());
            println!("  Next nonce: {}", account.nonce);
        }

        AccountCommands::Supply => {
            println!("Ledger on {}:", ctx.network());
            println!("  In escrow: {} sats", ctx.service.escrow_total().await.to_sat());
            println!("  Burned: {} sats", ctx.service.burned().await.to_sat());
            println!("  Next game: {}", ctx.service.next_game_id().await);
        }
    }

    Ok(())
}
