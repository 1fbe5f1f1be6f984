//! HabitCoach CLI entry point.
//!
//! Commands:
//! - `onboard`: Write the default config
//! - `gateway`: Start the HTTP API server
//! - `doctor`: Diagnose configuration and backends
//! - `recommend`: Ask a running gateway for exercise recommendations
//! - `converse`: Send one message to the coach
//! - `analyze`: Analyze a goal, journal entry or mood note
//! - `ledger`: Inspect or top up token balances

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "habitcoach",
    about = "HabitCoach: AI coaching gateway and tools",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Onboard,

    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Diagnose configuration, provider and backends
    Doctor,

    /// Get exercise recommendations from a running gateway
    Recommend {
        #[arg(short, long, env = "HABITCOACH_USER")]
        user: String,
        #[arg(short, long, default_value_t = 3)]
        count: usize,
        /// Gateway URL (defaults to [client].base_url)
        #[arg(long)]
        url: Option<String>,
    },

    /// Send one message to the coach
    Converse {
        #[arg(short, long, env = "HABITCOACH_USER")]
        user: String,
        #[arg(short, long)]
        message: String,
        /// Screen or topic label
        #[arg(long)]
        context: Option<String>,
        /// A goal to mention (repeatable)
        #[arg(long = "goal")]
        goals: Vec<String>,
        #[arg(long)]
        url: Option<String>,
    },

    /// Analyze a piece of text
    Analyze {
        #[arg(short, long, env = "HABITCOACH_USER")]
        user: String,
        #[arg(short, long)]
        text: String,
        /// goal_quality, journal_emotion, mood_pattern or general
        #[arg(long)]
        context: Option<String>,
        #[arg(long)]
        max_tokens: Option<u32>,
        #[arg(long)]
        url: Option<String>,
    },

    /// Token ledger administration
    Ledger {
        #[command(subcommand)]
        action: commands::ledger::LedgerAction,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Gateway { port } => commands::gateway::run(port).await?,
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Recommend { user, count, url } => commands::coach::recommend(user, count, url).await?,
        Commands::Converse {
            user,
            message,
            context,
            goals,
            url,
        } => commands::coach::converse(user, message, context, goals, url).await?,
        Commands::Analyze {
            user,
            text,
            context,
            max_tokens,
            url,
        } => commands::coach::analyze(user, text, context, max_tokens, url).await?,
        Commands::Ledger { action } => commands::ledger::run(action).await?,
    }

    Ok(())
}
