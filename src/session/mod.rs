//! Wallet session state
//!
//! [`WalletSessionStore`] is the context object the UI layer holds: it owns
//! the [`Session`] and [`BalanceSnapshot`] and drives the provider and
//! contract calls that keep them current.

pub mod store;

use alloy_primitives::{Address, U256};
use serde::Serialize;

use crate::units::short_address;

pub use store::WalletSessionStore;

/// Connection lifecycle as seen by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Connected wallet and chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    /// `None` while disconnected
    pub address: Option<Address>,
    pub chain_id: u64,
    /// Native balance in wei
    pub balance: U256,
    pub loading: bool,
    pub unsupported_network: bool,
}

impl Session {
    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    pub fn state(&self) -> ConnectionState {
        if self.loading {
            ConnectionState::Connecting
        } else if self.address.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Label for the connect button
    pub fn display_address(&self) -> String {
        match &self.address {
            Some(address) => short_address(address),
            None => "Connect".to_string(),
        }
    }
}

/// Balances read from the vault and the alchemist, all in wei
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BalanceSnapshot {
    /// Caller's vault position in underlying tokens
    pub deposit: U256,
    /// Total underlying held by the vault
    pub pool: U256,
    pub max_mint: U256,
}
