//! Recording mocks for the provider and contract seams

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, TxHash, B256, U256, U64};
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::addresses::AddressBook;
use crate::contracts::{ILeveragedVault, VaultApi, YieldApi, YieldTokenParams};
use crate::error::{Error, ProviderError, Result};
use crate::provider::{Log, PendingTransaction, TransactionReceipt, TransactionRequest, WalletProvider};

pub fn test_book() -> AddressBook {
    AddressBook {
        vault: Address::repeat_byte(0x11),
        alchemist: Address::repeat_byte(0x22),
        yield_token: Address::repeat_byte(0x33),
    }
}

/// Mined receipt carrying one `DepositUnderlying` log from `vault`
pub fn deposit_receipt(
    hash: TxHash,
    vault: Address,
    sender: Address,
    amount: U256,
) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: hash,
        block_number: Some(U64::from(1)),
        status: Some(U64::from(1)),
        logs: vec![Log {
            address: vault,
            topics: vec![
                ILeveragedVault::DepositUnderlying::SIGNATURE_HASH,
                sender.into_word(),
                Address::ZERO.into_word(),
            ],
            data: Bytes::from(amount.to_be_bytes::<32>().to_vec()),
        }],
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct WalletState {
    accounts: Vec<Address>,
    signer: Option<Address>,
    chain_id: u64,
    balance: U256,
    balance_owners: Vec<Address>,
    request_error: Option<ProviderError>,
    call_result: Bytes,
    last_call: Option<(Address, Bytes)>,
    sent: Vec<TransactionRequest>,
    receipts: HashMap<TxHash, TransactionReceipt>,
    revert_receipts: bool,
    calls: Vec<&'static str>,
}

/// Wallet that answers from in-memory state and records every call
pub struct MockWallet {
    state: Mutex<WalletState>,
    accounts_tx: broadcast::Sender<Vec<Address>>,
}

impl MockWallet {
    pub fn connected(chain_id: u64, account: Address) -> Self {
        let (accounts_tx, _) = broadcast::channel(16);
        Self {
            state: Mutex::new(WalletState {
                accounts: vec![account],
                signer: None,
                chain_id,
                balance: U256::ZERO,
                balance_owners: Vec::new(),
                request_error: None,
                call_result: Bytes::new(),
                last_call: None,
                sent: Vec::new(),
                receipts: HashMap::new(),
                revert_receipts: false,
                calls: Vec::new(),
            }),
            accounts_tx,
        }
    }

    /// Wallet with no authorized account
    pub fn locked(chain_id: u64) -> Self {
        let wallet = Self::connected(chain_id, Address::ZERO);
        wallet.set_accounts(vec![]);
        wallet
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        lock(&self.state).accounts = accounts;
    }

    pub fn set_balance(&self, balance: U256) {
        lock(&self.state).balance = balance;
    }

    /// Fixed signer, like a configured `wallet.account`
    pub fn set_signer(&self, signer: Address) {
        lock(&self.state).signer = Some(signer);
    }

    /// Addresses whose native balance was read, in order
    pub fn balance_owners(&self) -> Vec<Address> {
        lock(&self.state).balance_owners.clone()
    }

    pub fn reject_request_accounts(&self, error: ProviderError) {
        lock(&self.state).request_error = Some(error);
    }

    pub fn set_call_result(&self, data: Bytes) {
        lock(&self.state).call_result = data;
    }

    pub fn set_receipt(&self, receipt: TransactionReceipt) {
        lock(&self.state)
            .receipts
            .insert(receipt.transaction_hash, receipt);
    }

    pub fn revert_all_receipts(&self) {
        lock(&self.state).revert_receipts = true;
    }

    pub fn emit_accounts(&self, accounts: Vec<Address>) {
        let _ = self.accounts_tx.send(accounts);
    }

    pub fn subscriber_count(&self) -> usize {
        self.accounts_tx.receiver_count()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.state).calls.clone()
    }

    pub fn count(&self, name: &str) -> usize {
        lock(&self.state).calls.iter().filter(|c| **c == name).count()
    }

    pub fn last_call(&self) -> Option<(Address, Bytes)> {
        lock(&self.state).last_call.clone()
    }

    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        lock(&self.state).sent.clone()
    }

    fn record(&self, name: &'static str) {
        lock(&self.state).calls.push(name);
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        self.record("request_accounts");
        let state = lock(&self.state);
        match &state.request_error {
            Some(e) => Err(Error::Provider(e.clone())),
            None => Ok(state.accounts.clone()),
        }
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        self.record("accounts");
        Ok(lock(&self.state).accounts.clone())
    }

    async fn chain_id(&self) -> Result<u64> {
        self.record("chain_id");
        Ok(lock(&self.state).chain_id)
    }

    async fn signer_address(&self) -> Result<Address> {
        self.record("signer_address");
        let state = lock(&self.state);
        if let Some(signer) = state.signer {
            return Ok(signer);
        }
        state
            .accounts
            .first()
            .copied()
            .ok_or(Error::NoAccount)
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        self.record("balance");
        let mut state = lock(&self.state);
        state.balance_owners.push(address);
        Ok(state.balance)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.record("call");
        let mut state = lock(&self.state);
        state.last_call = Some((to, data));
        Ok(state.call_result.clone())
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        self.record("send_transaction");
        let mut state = lock(&self.state);
        state.sent.push(tx);
        Ok(B256::with_last_byte(state.sent.len() as u8))
    }

    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<TransactionReceipt>> {
        self.record("transaction_receipt");
        let state = lock(&self.state);
        let receipt = state
            .receipts
            .get(&hash)
            .cloned()
            .unwrap_or_else(|| TransactionReceipt {
                transaction_hash: hash,
                block_number: Some(U64::from(1)),
                status: Some(if state.revert_receipts {
                    U64::ZERO
                } else {
                    U64::from(1)
                }),
                logs: Vec::new(),
            });
        Ok(Some(receipt))
    }

    fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(1)
    }

    fn subscribe_accounts_changed(&self) -> broadcast::Receiver<Vec<Address>> {
        self.record("subscribe_accounts_changed");
        self.accounts_tx.subscribe()
    }
}

struct VaultState {
    shares: U256,
    conversions: HashMap<U256, U256>,
    pool: U256,
    pool_error: Option<ProviderError>,
    balance_of_owners: Vec<Address>,
    converted: Vec<U256>,
    deposits: Vec<(Address, U256)>,
    leverage_calls: usize,
}

/// Vault with canned answers
pub struct MockVault {
    state: Mutex<VaultState>,
    calls: AtomicUsize,
    next_hash: AtomicUsize,
}

impl MockVault {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(VaultState {
                shares: U256::ZERO,
                conversions: HashMap::new(),
                pool: U256::ZERO,
                pool_error: None,
                balance_of_owners: Vec::new(),
                converted: Vec::new(),
                deposits: Vec::new(),
                leverage_calls: 0,
            }),
            calls: AtomicUsize::new(0),
            next_hash: AtomicUsize::new(0x80),
        }
    }

    pub fn set_shares(&self, shares: U256) {
        lock(&self.state).shares = shares;
    }

    /// Shares without a configured conversion convert 1:1
    pub fn set_conversion(&self, shares: U256, underlying: U256) {
        lock(&self.state).conversions.insert(shares, underlying);
    }

    pub fn set_pool(&self, pool: U256) {
        let mut state = lock(&self.state);
        state.pool = pool;
        state.pool_error = None;
    }

    pub fn fail_pool(&self, error: ProviderError) {
        lock(&self.state).pool_error = Some(error);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn balance_of_owners(&self) -> Vec<Address> {
        lock(&self.state).balance_of_owners.clone()
    }

    pub fn converted_shares(&self) -> Vec<U256> {
        lock(&self.state).converted.clone()
    }

    pub fn deposits(&self) -> Vec<(Address, U256)> {
        lock(&self.state).deposits.clone()
    }

    pub fn leverage_count(&self) -> usize {
        lock(&self.state).leverage_calls
    }

    fn pending(&self, vault: Address, value: U256) -> PendingTransaction {
        let n = self.next_hash.fetch_add(1, Ordering::SeqCst);
        PendingTransaction {
            hash: B256::with_last_byte(n as u8),
            from: Address::ZERO,
            to: vault,
            value,
        }
    }
}

#[async_trait]
impl VaultApi for MockVault {
    async fn balance_of(&self, _vault: Address, owner: Address) -> Result<U256> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut state = lock(&self.state);
        state.balance_of_owners.push(owner);
        Ok(state.shares)
    }

    async fn convert_shares_to_underlying_tokens(
        &self,
        _vault: Address,
        shares: U256,
    ) -> Result<U256> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut state = lock(&self.state);
        state.converted.push(shares);
        Ok(state.conversions.get(&shares).copied().unwrap_or(shares))
    }

    async fn get_vault_deposited_balance(&self, _vault: Address) -> Result<U256> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = lock(&self.state);
        match &state.pool_error {
            Some(e) => Err(Error::Provider(e.clone())),
            None => Ok(state.pool),
        }
    }

    async fn leverage(&self, vault: Address) -> Result<PendingTransaction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.state).leverage_calls += 1;
        Ok(self.pending(vault, U256::ZERO))
    }

    async fn deposit_underlying(&self, vault: Address, value: U256) -> Result<PendingTransaction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.state).deposits.push((vault, value));
        Ok(self.pending(vault, value))
    }
}

/// Alchemist returning configurable parameters
pub struct MockAlchemist {
    params: Mutex<YieldTokenParams>,
    queried: Mutex<Vec<(Address, Address)>>,
}

impl MockAlchemist {
    pub fn new() -> Self {
        Self {
            params: Mutex::new(YieldTokenParams::default()),
            queried: Mutex::new(Vec::new()),
        }
    }

    pub fn set_params(&self, params: YieldTokenParams) {
        *lock(&self.params) = params;
    }

    pub fn queried(&self) -> Vec<(Address, Address)> {
        lock(&self.queried).clone()
    }
}

#[async_trait]
impl YieldApi for MockAlchemist {
    async fn get_yield_token_parameters(
        &self,
        alchemist: Address,
        yield_token: Address,
    ) -> Result<YieldTokenParams> {
        lock(&self.queried).push((alchemist, yield_token));
        Ok(lock(&self.params).clone())
    }
}
