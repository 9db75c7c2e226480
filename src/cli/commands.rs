//! CLI command implementations

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use dialoguer::Confirm;
use tracing::{info, warn};

use crate::config::Config;
use crate::contracts::{RpcAlchemist, RpcVault};
use crate::error::{catalog_message, ERROR_CATALOG};
use crate::provider::{JsonRpcProvider, WalletProvider};
use crate::session::WalletSessionStore;
use crate::units::format_native;

/// Build a session store wired to the configured JSON-RPC endpoint
pub fn build_store(config: &Config) -> Result<WalletSessionStore> {
    let provider: Arc<dyn WalletProvider> = Arc::new(
        JsonRpcProvider::from_config(config).context("Failed to create wallet provider")?,
    );
    let vault = Arc::new(RpcVault::new(provider.clone()));
    let alchemist = Arc::new(RpcAlchemist::new(provider.clone()));

    Ok(WalletSessionStore::new(
        provider,
        vault,
        alchemist,
        config.address_registry()?,
    ))
}

/// Connect and make sure the session can reach the contracts
async fn connected_store(config: &Config) -> Result<WalletSessionStore> {
    let mut store = build_store(config)?;
    store.connect().await?;

    if !store.session().is_connected() {
        anyhow::bail!("Wallet did not authorize any account");
    }
    if store.session().unsupported_network {
        anyhow::bail!(
            "Chain {} is not supported (configured: {:?})",
            store.session().chain_id,
            config.address_registry()?.chain_ids()
        );
    }

    Ok(store)
}

/// Message to show for a failed command, translated through the error catalog
pub fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<crate::Error>() {
        Some(e) => e.user_message(),
        None => err.to_string(),
    }
}

fn print_store(store: &WalletSessionStore) {
    let session = store.session();
    let balances = store.balances();

    println!("\n=== WALLET SESSION ===\n");
    println!("Account:  {}", session.display_address());
    if let Some(address) = session.address {
        println!("Address:  {}", address);
    }
    println!("Chain ID: {}", session.chain_id);
    if session.unsupported_network {
        println!("Network:  UNSUPPORTED");
    }
    println!("Balance:  {} ETH", format_native(session.balance));

    if let Some(book) = store.address_book() {
        println!("\n=== VAULT ===\n");
        println!("Vault:     {}", book.vault);
        println!("Deposit:   {} ETH", format_native(balances.deposit));
        println!("Pool:      {} ETH", format_native(balances.pool));
        println!("Max Mint:  {} ETH", format_native(balances.max_mint));
    }
}

/// Connect and show the session
pub async fn status(config: &Config, json: bool) -> Result<()> {
    let mut store = build_store(config)?;
    store.connect().await?;

    if json {
        let out = serde_json::json!({
            "state": store.state(),
            "session": store.session(),
            "balances": store.balances(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_store(&store);
    }

    Ok(())
}

/// Deposit native currency into the vault
pub async fn deposit(config: &Config, amount: f64, force: bool) -> Result<()> {
    let mut store = connected_store(config).await?;

    let available = store.session().balance;
    info!(
        "Depositing {} ETH (wallet balance {} ETH)",
        amount,
        format_native(available)
    );

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Deposit {} ETH into the vault? This cannot be undone.",
                amount
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("Deposit cancelled.");
            return Ok(());
        }
    }

    let pending = store.deposit_eth(amount).await?;
    println!("Submitted deposit: {}", pending.hash);
    println!("Waiting for confirmation...");

    match store.confirm_deposit(&pending).await? {
        Some(event) => {
            println!("Deposited {} ETH", format_native(event.amount));
            print_store(&store);
        }
        None => warn!("Deposit mined but the vault did not report it; balances not refreshed"),
    }

    Ok(())
}

/// Trigger the vault's leverage action
pub async fn leverage(config: &Config, force: bool) -> Result<()> {
    let mut store = connected_store(config).await?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt("Trigger vault leverage?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("Leverage cancelled.");
            return Ok(());
        }
    }

    let receipt = store.leverage().await?;
    println!("Leverage confirmed in tx {}", receipt.transaction_hash);

    store.refresh_balances().await?;
    print_store(&store);

    Ok(())
}

/// Follow account changes until the provider stops reporting them
pub async fn watch(config: &Config) -> Result<()> {
    let mut store = build_store(config)?;
    store.connect().await?;
    print_store(&store);

    println!("\nWatching for account changes (Ctrl+C to stop)...");

    loop {
        tokio::select! {
            result = store.next_account_event() => {
                match result {
                    Ok(true) => {
                        println!("\n[{}] Account changed", Utc::now().format("%H:%M:%S"));
                        print_store(&store);
                    }
                    Ok(false) => {
                        println!("Account notifications ended.");
                        break;
                    }
                    // Keep watching; the next notification may succeed
                    Err(e) => warn!("Failed to apply account change: {}", e.user_message()),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nStopping.");
                break;
            }
        }
    }

    store.disconnect();
    Ok(())
}

/// Show current configuration
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}

/// Look up provider error codes
pub fn errors(code: Option<i64>) -> Result<()> {
    match code {
        Some(code) => match catalog_message(code) {
            Some(message) => println!("{}: {}", code, message),
            None => println!("{}: unknown error code", code),
        },
        None => {
            for (code, message) in ERROR_CATALOG {
                println!("{:>7}  {}", code, message);
            }
        }
    }
    Ok(())
}
