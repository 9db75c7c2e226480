//! Wallet session store
//!
//! Mediates between the UI, the wallet provider and the two contracts.
//! Every action awaits its provider and contract calls in sequence; a
//! failing step propagates its error and leaves whatever was already
//! written in place.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, info, warn};

use crate::addresses::{AddressBook, AddressRegistry};
use crate::contracts::{DepositEvent, VaultApi, YieldApi};
use crate::error::{Error, Result};
use crate::provider::{PendingTransaction, TransactionReceipt, WalletProvider};
use crate::units;

use super::{BalanceSnapshot, ConnectionState, Session};

/// Session context for one wallet connection
pub struct WalletSessionStore {
    provider: Arc<dyn WalletProvider>,
    vault: Arc<dyn VaultApi>,
    yield_api: Arc<dyn YieldApi>,
    registry: AddressRegistry,
    session: Session,
    balances: BalanceSnapshot,
    /// Address book selected at connect time
    book: Option<AddressBook>,
    account_events: Option<broadcast::Receiver<Vec<Address>>>,
}

impl WalletSessionStore {
    pub fn new(
        provider: Arc<dyn WalletProvider>,
        vault: Arc<dyn VaultApi>,
        yield_api: Arc<dyn YieldApi>,
        registry: AddressRegistry,
    ) -> Self {
        Self {
            provider,
            vault,
            yield_api,
            registry,
            session: Session::default(),
            balances: BalanceSnapshot::default(),
            book: None,
            account_events: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Cached balances; zeroed while disconnected
    pub fn balances(&self) -> BalanceSnapshot {
        if self.session.is_connected() {
            self.balances
        } else {
            BalanceSnapshot::default()
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    pub fn address_book(&self) -> Option<&AddressBook> {
        self.book.as_ref()
    }

    pub fn is_subscribed(&self) -> bool {
        self.account_events.is_some()
    }

    /// Authorize the wallet and load session state.
    ///
    /// Does nothing when an address is already set or a connect is in
    /// flight. An authorization error is logged and the sequence continues
    /// with whatever accounts the wallet already exposes.
    ///
    /// Any other error is returned with the state written so far kept. If the
    /// address was already set, the session stays connected without an
    /// account subscription and later calls are no-ops; call
    /// [`disconnect`](Self::disconnect) before retrying.
    pub async fn connect(&mut self) -> Result<()> {
        if self.session.address.is_some() || self.session.loading {
            debug!("Connect skipped: session already connected or connecting");
            return Ok(());
        }

        self.session.loading = true;
        let result = self.connect_sequence().await;
        self.session.loading = false;
        result
    }

    async fn connect_sequence(&mut self) -> Result<()> {
        info!("Connecting wallet...");

        if let Err(e) = self.provider.request_accounts().await {
            warn!("Account authorization failed: {}", e);
        }

        let accounts = self.provider.accounts().await?;
        if accounts.is_empty() {
            warn!("Wallet exposes no authorized account - staying disconnected");
            return Ok(());
        }

        let chain_id = self.provider.chain_id().await?;
        self.session.chain_id = chain_id;

        let address = self.provider.signer_address().await?;
        self.session.address = Some(address);
        self.session.balance = self.provider.balance(address).await?;

        match self.registry.get(chain_id).copied() {
            Some(book) => {
                self.book = Some(book);
                self.session.unsupported_network = false;
                self.refresh_balances().await?;
            }
            None => {
                warn!("Chain {} has no address book - contract reads skipped", chain_id);
                self.book = None;
                self.session.unsupported_network = true;
            }
        }

        self.subscribe();

        info!(
            "Connected {} on chain {} (balance {} ETH)",
            address,
            chain_id,
            units::format_native(self.session.balance)
        );
        Ok(())
    }

    fn subscribe(&mut self) {
        if self.account_events.is_none() {
            self.account_events = Some(self.provider.subscribe_accounts_changed());
            debug!("Subscribed to account changes");
        }
    }

    /// Drop the account subscription and forget the session
    pub fn disconnect(&mut self) {
        if self.account_events.take().is_some() {
            debug!("Unsubscribed from account changes");
        }
        self.session = Session::default();
        self.balances = BalanceSnapshot::default();
        self.book = None;
        info!("Wallet disconnected");
    }

    /// React to the wallet reporting a new account list.
    ///
    /// Balances are zeroed first. An empty list means the wallet was locked
    /// or disconnected and triggers a fresh connect; otherwise the first
    /// account becomes the session address. The chain id is left alone.
    pub async fn on_accounts_changed(&mut self, accounts: &[Address]) -> Result<()> {
        info!(?accounts, "Account changed");

        self.session.balance = U256::ZERO;
        self.balances = BalanceSnapshot::default();

        match accounts.first() {
            Some(address) => {
                self.session.address = Some(*address);
                Ok(())
            }
            None => {
                self.session.address = None;
                self.connect().await
            }
        }
    }

    /// Apply an account-change notification and reload balances for the
    /// newly adopted account
    pub async fn handle_account_event(&mut self, accounts: &[Address]) -> Result<()> {
        self.on_accounts_changed(accounts).await?;

        if accounts.is_empty() || self.session.address.is_none() {
            return Ok(());
        }

        self.refresh_native_balance().await?;
        if self.book.is_some() {
            self.refresh_balances().await?;
        }
        Ok(())
    }

    /// Apply every notification already queued; returns how many were handled
    pub async fn poll_account_events(&mut self) -> Result<usize> {
        let mut queued = Vec::new();

        if let Some(events) = self.account_events.as_mut() {
            loop {
                match events.try_recv() {
                    Ok(accounts) => queued.push(accounts),
                    Err(TryRecvError::Lagged(skipped)) => {
                        warn!("Missed {} account notifications", skipped);
                    }
                    Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                }
            }
        }

        for accounts in &queued {
            self.handle_account_event(accounts).await?;
        }
        Ok(queued.len())
    }

    /// Wait for the next notification and apply it.
    ///
    /// Returns `false` when there is no subscription or the provider closed it.
    pub async fn next_account_event(&mut self) -> Result<bool> {
        let Some(events) = self.account_events.as_mut() else {
            return Ok(false);
        };

        let received = loop {
            match events.recv().await {
                Ok(accounts) => break Some(accounts),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Missed {} account notifications", skipped);
                }
                Err(RecvError::Closed) => break None,
            }
        };

        match received {
            Some(accounts) => {
                self.handle_account_event(&accounts).await?;
                Ok(true)
            }
            None => {
                debug!("Account notifications closed by provider");
                self.account_events = None;
                Ok(false)
            }
        }
    }

    /// Re-read the signer's native balance
    pub async fn refresh_native_balance(&mut self) -> Result<U256> {
        let address = match self.session.address {
            Some(address) => address,
            None => self.provider.signer_address().await?,
        };
        let balance = self.provider.balance(address).await?;
        self.session.balance = balance;
        Ok(balance)
    }

    /// Deposit, pool and mint capacity, in that order
    pub async fn refresh_balances(&mut self) -> Result<BalanceSnapshot> {
        self.get_deposit_balance().await?;
        self.get_full_balance().await?;
        self.get_mint_capacity().await?;
        Ok(self.balances)
    }

    /// Caller's vault shares converted to underlying tokens
    pub async fn get_deposit_balance(&mut self) -> Result<U256> {
        let book = self.active_book()?;
        let address = self.session.address.ok_or(Error::NotConnected)?;

        let shares = self.vault.balance_of(book.vault, address).await?;
        let deposit = self
            .vault
            .convert_shares_to_underlying_tokens(book.vault, shares)
            .await?;
        debug!(%shares, %deposit, "Deposit balance");

        self.balances.deposit = deposit;
        Ok(deposit)
    }

    /// Total underlying deposited in the vault
    pub async fn get_full_balance(&mut self) -> Result<U256> {
        let book = self.active_book()?;

        let pool = self.vault.get_vault_deposited_balance(book.vault).await?;
        debug!(%pool, "Vault deposited balance");

        self.balances.pool = pool;
        Ok(pool)
    }

    /// Max mint ceiling from the yield token's parameters
    pub async fn get_mint_capacity(&mut self) -> Result<U256> {
        let book = self.active_book()?;

        let params = self
            .yield_api
            .get_yield_token_parameters(book.alchemist, book.yield_token)
            .await?;
        let max_mint = params.max_mint();
        debug!(%max_mint, "Mint capacity");

        self.balances.max_mint = max_mint;
        Ok(max_mint)
    }

    /// Trigger the vault's leverage action and wait for it to be mined
    pub async fn leverage(&self) -> Result<TransactionReceipt> {
        let book = self.active_book()?;

        let pending = self.vault.leverage(book.vault).await?;
        info!(hash = %pending.hash, "Leverage submitted, waiting for confirmation");

        let receipt = self.provider.wait_for_receipt(pending.hash).await?;
        if !receipt.succeeded() {
            return Err(Error::TransactionReverted(format!(
                "leverage {}",
                pending.hash
            )));
        }

        info!(hash = %pending.hash, "Leverage confirmed");
        Ok(receipt)
    }

    /// Submit a payable deposit of `amount` native units.
    ///
    /// The amount is rendered with 17 fractional digits before conversion to
    /// wei. Balances are not refreshed here; pass the returned handle to
    /// [`confirm_deposit`](Self::confirm_deposit).
    pub async fn deposit_eth(&self, amount: f64) -> Result<PendingTransaction> {
        let book = self.active_book()?;

        let text = units::fixed_amount(amount)?;
        let value = units::parse_native(&text)?;
        info!("Depositing {} ETH into vault {}", text, book.vault);

        let pending = self.vault.deposit_underlying(book.vault, value).await?;
        info!(hash = %pending.hash, "Deposit submitted");
        Ok(pending)
    }

    /// Wait for a deposit to be mined, then reload deposit, pool and mint
    /// capacity if the vault emitted `DepositUnderlying`
    pub async fn confirm_deposit(
        &mut self,
        pending: &PendingTransaction,
    ) -> Result<Option<DepositEvent>> {
        let book = self.active_book()?;

        let receipt = self.provider.wait_for_receipt(pending.hash).await?;
        if !receipt.succeeded() {
            return Err(Error::TransactionReverted(format!(
                "depositUnderlying {}",
                pending.hash
            )));
        }

        let event = receipt
            .logs
            .iter()
            .filter(|log| log.address == book.vault)
            .find_map(DepositEvent::from_log);

        match &event {
            Some(deposit) => {
                info!(
                    "Deposit of {} confirmed for {}",
                    units::format_native(deposit.amount),
                    deposit.sender
                );
                self.refresh_balances().await?;
            }
            None => warn!(hash = %pending.hash, "Deposit mined without a DepositUnderlying event"),
        }

        Ok(event)
    }

    fn active_book(&self) -> Result<AddressBook> {
        if !self.session.is_connected() {
            return Err(Error::NotConnected);
        }
        self.book
            .ok_or(Error::UnsupportedNetwork(self.session.chain_id))
    }
}
