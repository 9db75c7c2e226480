//! Per-network contract address table

use std::collections::HashMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Contract addresses for one network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBook {
    /// Leveraged vault
    pub vault: Address,
    /// Yield integration (alchemist)
    pub alchemist: Address,
    /// Yield token whose parameters bound the mint capacity
    pub yield_token: Address,
}

/// Address books keyed by chain id
#[derive(Debug, Clone, Default)]
pub struct AddressRegistry {
    books: HashMap<u64, AddressBook>,
}

impl AddressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from config entries whose keys are chain ids as strings
    pub fn from_entries<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a String, &'a AddressBook)>,
    {
        let mut registry = Self::new();
        for (key, book) in entries {
            let chain_id: u64 = key
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("Invalid chain id key: {}", key)))?;
            registry.insert(chain_id, *book);
        }
        Ok(registry)
    }

    pub fn insert(&mut self, chain_id: u64, book: AddressBook) {
        self.books.insert(chain_id, book);
    }

    pub fn get(&self, chain_id: u64) -> Option<&AddressBook> {
        self.books.get(&chain_id)
    }

    pub fn is_supported(&self, chain_id: u64) -> bool {
        self.books.contains_key(&chain_id)
    }

    /// Supported chain ids, sorted
    pub fn chain_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.books.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}
