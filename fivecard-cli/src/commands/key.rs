use super::Context;
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::{Confirm, Password};
use fivecard_core::CoreError;
use fivecard_game::Result;

#[derive(Subcommand)]
pub enum KeyCommands {
    /// Create a new player key
    Create {
        /// Key name
        name: String,
    },
    /// Import a key from a mnemonic
    Import {
        /// Key name
        name: String,
        /// Mnemonic phrase (will prompt if not provided)
        #[arg(short, long)]
        mnemonic: Option<String>,
    },
    /// List all keys
    List,
    /// Show a key's address and account
    Show {
        /// Key name
        name: String,
    },
    /// Delete a key
    Delete {
        /// Key name
        name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn handle_key_command(cmd: KeyCommands, ctx: &Context) -> Result<()> {
    match cmd {
        KeyCommands::Create { name } => {
            println!("Creating key '{}'...", name);
            let (key, mnemonic) = ctx.keys.create_key(&name).await?;

            println!("Key created successfully!");
            println!();
            println!("IMPORTANT: Save your mnemonic phrase securely!");
            println!("Mnemonic: {}", mnemonic);
            println!();
            println!("  Name: {}", key.name());
            println!("  Network: {}", key.network());
            println!("  Address: {}", key.address());
        }

        KeyCommands::Import { name, mnemonic } => {
            let mnemonic = match mnemonic {
                Some(m) => m,
                None => Password::new()
                    .with_prompt("Enter mnemonic phrase")
                    .interact()
                    .map_err(|e| CoreError::dialog(e.to_string()))?,
            };

            let key = ctx.keys.import_key(&name, &mnemonic).await?;
            println!("Key imported successfully!");
            println!("  Name: {}", key.name());
            println!("  Address: {}", key.address());
        }

        KeyCommands::List => {
            let keys = ctx.keys.list_keys().await?;
            if keys.is_empty() {
                println!("No keys found.");
                println!("Create one with: fivecard key create <name>");
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Name", "Address", "Balance", "Created"]);
            for summary in keys {
                let account = ctx.service.account(&summary.address).await;
                table.add_row(vec![
                    summary.name.clone(),
                    summary.address.to_string(),
                    format!("{} sats", account.balance.to_sat()),
                    summary.created_at.format("%Y-%m-%d %H:%M").to_string(),
                ]);
            }
            println!("{}", table);
        }

        KeyCommands::Show { name } => {
            let key = ctx.keys.load_key(&name).await?;
            let account = ctx.service.account(&key.address()).await;

            println!("Key Information:");
            println!("  Name: {}", key.name());
            println!("  Network: {}", key.network());
            println!("  Address: {}", key.address());
            println!("  Public key: {}", key.public_key());
            println!("  Balance: {} sats", account.balance.to_sat());
            println!("  Next nonce: {}", account.nonce);
        }

        KeyCommands::Delete { name, force } => {
            if !force {
                let confirm = Confirm::new()
                    .with_prompt(format!(
                        "Delete key '{}'? Without the mnemonic its balance is lost.",
                        name
                    ))
                    .default(false)
                    .interact()
                    .map_err(|e| CoreError::dialog(e.to_string()))?;

                if !confirm {
                    println!("Deletion cancelled.");
                    return Ok(());
                }
            }

            ctx.keys.delete_key(&name).await?;
            println!("Key '{}' deleted.", name);
        }
    }

    Ok(())
}
