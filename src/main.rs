//! Logris Wallet - session CLI for the Logris leveraged vault
//!
//! # WARNING
//! - `deposit` and `leverage` send real transactions from the connected wallet.
//! - Deposit amounts are rounded to 17 fractional digits before conversion to wei.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

// Use the library crate
use logris_wallet::cli::commands;
use logris_wallet::config::Config;

/// Logris Wallet - connect, inspect and act on the leveraged vault
#[derive(Parser)]
#[command(name = "logris")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect the wallet and show session balances
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Deposit ETH into the vault
    Deposit {
        /// Amount in ETH
        amount: f64,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Trigger the vault's leverage action
    Leverage {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Follow wallet account changes
    Watch,

    /// Show current configuration (secrets masked)
    Config,

    /// Explain provider / JSON-RPC error codes
    Errors {
        /// Error code to look up (lists all when omitted)
        #[arg(allow_hyphen_values = true)]
        code: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("logris_wallet=info".parse()?),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Error codes need no configuration
    if let Commands::Errors { code } = cli.command {
        return commands::errors(code);
    }

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Status { json } => commands::status(&config, json).await,
        Commands::Deposit { amount, force } => commands::deposit(&config, amount, force).await,
        Commands::Leverage { force } => commands::leverage(&config, force).await,
        Commands::Watch => commands::watch(&config).await,
        Commands::Config => commands::show_config(&config),
        Commands::Errors { code } => commands::errors(code),
    };

    if let Err(e) = result {
        error!("Command failed: {}", commands::describe_error(&e));
        std::process::exit(1);
    }

    Ok(())
}
