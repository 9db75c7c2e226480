//! Logris Wallet Library
//!
//! Session store for the Logris leveraged vault: tracks the connected
//! wallet, its balances and chain, and calls the vault and alchemist
//! contracts through a wallet provider.

pub mod addresses;
pub mod cli;
pub mod config;
pub mod contracts;
pub mod error;
pub mod provider;
pub mod session;
pub mod units;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use session::WalletSessionStore;
