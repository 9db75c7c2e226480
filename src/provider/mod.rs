//! Wallet provider abstraction
//!
//! Everything the session store needs from a wallet lives behind
//! [`WalletProvider`]: account authorization, chain queries, raw contract
//! calls, transaction submission and account-change notifications.
//!
//! The concrete [`JsonRpcProvider`] speaks EIP-1193 style JSON-RPC over HTTP.

pub mod rpc;

use std::time::Duration;

use alloy_primitives::{Address, Bytes, TxHash, B256, U256, U64};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::Result;

pub use rpc::JsonRpcProvider;

/// Receipt poll interval used when a provider does not override it
pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Transaction to be signed and sent by the wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

/// Handle for a submitted, not yet confirmed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    pub hash: TxHash,
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

/// Log entry emitted by a contract
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Log {
    pub address: Address,
    #[serde(default)]
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
}

/// Mined transaction receipt
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    #[serde(default)]
    pub block_number: Option<U64>,
    /// 1 on success, 0 on revert; absent on pre-Byzantium chains
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub logs: Vec<Log>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status.map(|s| s != U64::ZERO).unwrap_or(true)
    }
}

/// Capabilities the session store consumes from a wallet
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the wallet to authorize and reveal its accounts
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// Accounts already authorized for this session
    async fn accounts(&self) -> Result<Vec<Address>>;

    async fn chain_id(&self) -> Result<u64>;

    /// Address that signs transactions
    async fn signer_address(&self) -> Result<Address>;

    /// Native balance in wei
    async fn balance(&self, address: Address) -> Result<U256>;

    /// Read-only contract call
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    /// Sign and send; returns the transaction hash
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash>;

    /// Receipt for a mined transaction, `None` while pending
    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<TransactionReceipt>>;

    fn receipt_poll_interval(&self) -> Duration {
        DEFAULT_RECEIPT_POLL_INTERVAL
    }

    /// Wait until the transaction is mined.
    ///
    /// No timeout: a transaction that never lands keeps this pending.
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TransactionReceipt> {
        loop {
            if let Some(receipt) = self.transaction_receipt(hash).await? {
                return Ok(receipt);
            }
            tokio::time::sleep(self.receipt_poll_interval()).await;
        }
    }

    /// Subscribe to accounts-changed notifications.
    ///
    /// Dropping the receiver unsubscribes.
    fn subscribe_accounts_changed(&self) -> broadcast::Receiver<Vec<Address>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_deserialize() {
        let json = r#"{
            "transactionHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "blockNumber": "0x10",
            "status": "0x1",
            "gasUsed": "0x5208",
            "logs": [{
                "address": "0x2222222222222222222222222222222222222222",
                "topics": ["0x3333333333333333333333333333333333333333333333333333333333333333"],
                "data": "0x"
            }]
        }"#;

        let receipt: TransactionReceipt = serde_json::from_str(json).unwrap();
        assert!(receipt.succeeded());
        assert_eq!(receipt.block_number, Some(U64::from(16)));
        assert_eq!(receipt.logs.len(), 1);
        assert_eq!(receipt.logs[0].address, Address::repeat_byte(0x22));
    }

    #[test]
    fn test_reverted_receipt() {
        let json = r#"{
            "transactionHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "status": "0x0"
        }"#;

        let receipt: TransactionReceipt = serde_json::from_str(json).unwrap();
        assert!(!receipt.succeeded());
        assert!(receipt.logs.is_empty());
        assert_eq!(receipt.block_number, None);
    }

    #[test]
    fn test_transaction_request_serialize() {
        let tx = TransactionRequest {
            from: Address::repeat_byte(0x01),
            to: Address::repeat_byte(0x02),
            value: U256::from(255),
            data: Bytes::from(vec![0xde, 0xad]),
        };

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["value"], "0xff");
        assert_eq!(json["data"], "0xdead");
        assert_eq!(json["to"], "0x0202020202020202020202020202020202020202");
    }
}
