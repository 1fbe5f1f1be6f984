//! `habitcoach ledger`: Inspect and top up token balances.
//!
//! Replenishment belongs to billing in production; this is the operator's
//! way to seed balances for a local SQLite ledger.

use clap::Subcommand;
use habitcoach_config::AppConfig;
use habitcoach_core::TokenLedger;

#[derive(Subcommand)]
pub enum LedgerAction {
    /// Show a user's balance
    Balance {
        #[arg(short, long, env = "HABITCOACH_USER")]
        user: String,
    },
    /// Add tokens to a user's balance
    Credit {
        #[arg(short, long, env = "HABITCOACH_USER")]
        user: String,
        #[arg(short, long)]
        amount: u64,
    },
}

pub async fn run(action: LedgerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if config.ledger.backend != "sqlite" {
        println!("⚠️  Ledger backend is '{}'; balances live only inside a running gateway.", config.ledger.backend);
        return Ok(());
    }

    let path = config.ledger_path();
    let ledger = habitcoach_store::open_sqlite(&path).await?;

    match action {
        LedgerAction::Balance { user } => match ledger.balance(&user).await? {
            Some(balance) => println!("💰 {user}: {balance} tokens"),
            None => println!("💰 {user}: no ledger entry (0 tokens)"),
        },
        LedgerAction::Credit { user, amount } => {
            let balance = ledger.credit(&user, amount).await?;
            println!("✅ Credited {amount} tokens to {user}");
            println!("   New balance: {balance}");
            println!("   Ledger: {}", path.display());
        }
    }

    Ok(())
}
