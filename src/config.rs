//! Configuration loading and validation

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use alloy_primitives::Address;
use anyhow::{Context, Result};
use serde::Deserialize;

use crate::addresses::{AddressBook, AddressRegistry};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub rpc: RpcConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    /// Address books keyed by chain id
    #[serde(default)]
    pub networks: HashMap<String, AddressBook>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Signer override; when unset the first `eth_accounts` entry signs
    #[serde(default)]
    pub account: Option<Address>,
    /// How often the provider polls `eth_accounts` for changes
    #[serde(default = "default_account_poll_interval_ms")]
    pub account_poll_interval_ms: u64,
    /// How often a pending transaction's receipt is polled
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            account: None,
            account_poll_interval_ms: default_account_poll_interval_ms(),
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
        }
    }
}

impl WalletConfig {
    pub fn account_poll_interval(&self) -> Duration {
        Duration::from_millis(self.account_poll_interval_ms)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}

fn default_rpc_endpoint() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_account_poll_interval_ms() -> u64 {
    1_000
}

fn default_receipt_poll_interval_ms() -> u64 {
    2_000
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("rpc.endpoint", default_rpc_endpoint())?
            .set_default("rpc.timeout_ms", default_timeout_ms() as i64)?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix LOGRIS_)
            .add_source(
                config::Environment::with_prefix("LOGRIS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        url::Url::parse(&self.rpc.endpoint)
            .with_context(|| format!("Invalid rpc.endpoint: {}", self.rpc.endpoint))?;

        if self.rpc.timeout_ms == 0 {
            anyhow::bail!("rpc.timeout_ms must be positive");
        }

        if self.wallet.account_poll_interval_ms == 0 {
            anyhow::bail!("wallet.account_poll_interval_ms must be positive");
        }

        if self.wallet.receipt_poll_interval_ms == 0 {
            anyhow::bail!("wallet.receipt_poll_interval_ms must be positive");
        }

        let registry = self.address_registry()?;
        if registry.is_empty() {
            tracing::warn!("No networks configured - every chain will be reported as unsupported");
        }

        Ok(())
    }

    /// Address books as a registry keyed by numeric chain id
    pub fn address_registry(&self) -> Result<AddressRegistry> {
        AddressRegistry::from_entries(&self.networks).map_err(|e| anyhow::anyhow!(e))
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        let mut networks: Vec<(&String, &AddressBook)> = self.networks.iter().collect();
        networks.sort_by(|a, b| a.0.cmp(b.0));

        let mut out = format!(
            r#"Configuration:
  RPC:
    endpoint: {}
    timeout: {}ms
  Wallet:
    account: {}
    account_poll_interval: {}ms
    receipt_poll_interval: {}ms
  Networks:
"#,
            mask_url(&self.rpc.endpoint),
            self.rpc.timeout_ms,
            self.wallet
                .account
                .map(|a| a.to_string())
                .unwrap_or_else(|| "(first authorized account)".to_string()),
            self.wallet.account_poll_interval_ms,
            self.wallet.receipt_poll_interval_ms,
        );

        if networks.is_empty() {
            out.push_str("    (none)\n");
        }
        for (chain_id, book) in networks {
            out.push_str(&format!(
                "    chain {}:\n      vault: {}\n      alchemist: {}\n      yield_token: {}\n",
                chain_id, book.vault, book.alchemist, book.yield_token
            ));
        }

        out
    }
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc: RpcConfig {
                endpoint: default_rpc_endpoint(),
                timeout_ms: default_timeout_ms(),
            },
            wallet: WalletConfig::default(),
            networks: HashMap::new(),
        }
    }
}
