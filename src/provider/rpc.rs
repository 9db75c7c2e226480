//! JSON-RPC wallet provider
//!
//! Sends EIP-1193 style requests (`eth_requestAccounts`, `eth_accounts`,
//! `eth_sendTransaction`, ...) to a wallet or node endpoint over HTTP.
//! Account changes are detected by polling `eth_accounts` in a background
//! task that only runs while someone is subscribed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, TxHash, U256, U64};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, ProviderError, Result};

use super::{TransactionReceipt, TransactionRequest, WalletProvider};

/// Buffered account-change notifications per subscriber
const ACCOUNT_EVENT_CAPACITY: usize = 16;

/// JSON-RPC 2.0 response envelope
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// HTTP transport shared with the account poller
struct RpcTransport {
    client: Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl RpcTransport {
    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(method, id, "JSON-RPC request");

        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Rpc(format!("{} HTTP {}: {}", method, status, body)));
        }

        let envelope: RpcResponse = response.json().await?;

        if let Some(error) = envelope.error {
            debug!(method, code = error.code, "JSON-RPC error: {}", error.message);
            return Err(Error::Provider(ProviderError::new(error.code, error.message)));
        }

        Ok(serde_json::from_value(envelope.result)?)
    }
}

/// Wallet provider backed by a JSON-RPC endpoint
pub struct JsonRpcProvider {
    transport: Arc<RpcTransport>,
    /// Signer override
    account: Option<Address>,
    receipt_poll_interval: Duration,
    account_poll_interval: Duration,
    accounts_tx: broadcast::Sender<Vec<Address>>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl JsonRpcProvider {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        let (accounts_tx, _) = broadcast::channel(ACCOUNT_EVENT_CAPACITY);

        Ok(Self {
            transport: Arc::new(RpcTransport {
                client,
                endpoint: endpoint.into(),
                next_id: AtomicU64::new(1),
            }),
            account: None,
            receipt_poll_interval: super::DEFAULT_RECEIPT_POLL_INTERVAL,
            account_poll_interval: Duration::from_secs(1),
            accounts_tx,
            poller: Mutex::new(None),
        })
    }

    /// Build from the `rpc` and `wallet` config sections
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut provider = Self::new(
            config.rpc.endpoint.clone(),
            Duration::from_millis(config.rpc.timeout_ms),
        )?;
        provider.account = config.wallet.account;
        provider.receipt_poll_interval = config.wallet.receipt_poll_interval();
        provider.account_poll_interval = config.wallet.account_poll_interval();
        Ok(provider)
    }

    pub fn with_account(mut self, account: Address) -> Self {
        self.account = Some(account);
        self
    }

    /// Raw EIP-1193 request
    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        self.transport.request(method, params).await
    }

    fn ensure_poller(&self) {
        let mut guard = match self.poller.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if guard.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime - account changes will not be reported");
            return;
        };

        info!(
            "Watching for account changes every {}ms",
            self.account_poll_interval.as_millis()
        );

        *guard = Some(runtime.spawn(poll_accounts(
            self.transport.clone(),
            self.accounts_tx.clone(),
            self.account_poll_interval,
        )));
    }
}

/// Emit the account list whenever `eth_accounts` changes.
///
/// The first successful read is the baseline and is not reported. Exits once
/// no subscriber is left.
async fn poll_accounts(
    transport: Arc<RpcTransport>,
    accounts_tx: broadcast::Sender<Vec<Address>>,
    poll_interval: Duration,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    let mut last: Option<Vec<Address>> = None;

    loop {
        ticker.tick().await;

        if accounts_tx.receiver_count() == 0 {
            debug!("No account subscribers left, stopping poller");
            return;
        }

        let accounts: Vec<Address> = match transport.request("eth_accounts", json!([])).await {
            Ok(accounts) => accounts,
            Err(e) => {
                warn!("Account poll failed: {}", e);
                continue;
            }
        };

        if let Some(previous) = &last {
            if *previous != accounts {
                debug!(?accounts, "Accounts changed");
                // Receivers may all be gone by now; the next tick exits.
                let _ = accounts_tx.send(accounts.clone());
            }
        }
        last = Some(accounts);
    }
}

#[async_trait]
impl WalletProvider for JsonRpcProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        self.request("eth_requestAccounts", json!([])).await
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        self.request("eth_accounts", json!([])).await
    }

    async fn chain_id(&self) -> Result<u64> {
        let id: U64 = self.request("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    async fn signer_address(&self) -> Result<Address> {
        if let Some(account) = self.account {
            return Ok(account);
        }
        self.accounts().await?.first().copied().ok_or(Error::NoAccount)
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        self.request("eth_getBalance", json!([address, "latest"]))
            .await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        info!(to = %tx.to, value = %tx.value, "Sending transaction");
        self.request("eth_sendTransaction", json!([tx])).await
    }

    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<TransactionReceipt>> {
        self.request("eth_getTransactionReceipt", json!([hash]))
            .await
    }

    fn receipt_poll_interval(&self) -> Duration {
        self.receipt_poll_interval
    }

    fn subscribe_accounts_changed(&self) -> broadcast::Receiver<Vec<Address>> {
        let receiver = self.accounts_tx.subscribe();
        self.ensure_poller();
        receiver
    }
}
