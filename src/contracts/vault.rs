//! Leveraged vault over a wallet provider

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::provider::{PendingTransaction, TransactionRequest, WalletProvider};

use super::{ILeveragedVault, VaultApi};

/// [`VaultApi`] that ABI-encodes calls and runs them through the provider
pub struct RpcVault {
    provider: Arc<dyn WalletProvider>,
}

impl RpcVault {
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self { provider }
    }

    async fn read<C: SolCall + Send>(&self, vault: Address, call: C) -> Result<C::Return> {
        let output = self
            .provider
            .call(vault, Bytes::from(call.abi_encode()))
            .await?;
        Ok(C::abi_decode_returns(&output)?)
    }

    async fn submit<C: SolCall + Send>(
        &self,
        vault: Address,
        call: C,
        value: U256,
    ) -> Result<PendingTransaction> {
        let from = self.provider.signer_address().await?;
        let tx = TransactionRequest {
            from,
            to: vault,
            value,
            data: Bytes::from(call.abi_encode()),
        };
        let hash = self.provider.send_transaction(tx).await?;
        debug!(%hash, "{} submitted", C::SIGNATURE);

        Ok(PendingTransaction {
            hash,
            from,
            to: vault,
            value,
        })
    }
}

#[async_trait]
impl VaultApi for RpcVault {
    async fn balance_of(&self, vault: Address, owner: Address) -> Result<U256> {
        self.read(vault, ILeveragedVault::balanceOfCall::new((owner,)))
            .await
    }

    async fn convert_shares_to_underlying_tokens(
        &self,
        vault: Address,
        shares: U256,
    ) -> Result<U256> {
        self.read(
            vault,
            ILeveragedVault::convertSharesToUnderlyingTokensCall::new((shares,)),
        )
        .await
    }

    async fn get_vault_deposited_balance(&self, vault: Address) -> Result<U256> {
        self.read(vault, ILeveragedVault::getVaultDepositedBalanceCall::new(()))
            .await
    }

    async fn leverage(&self, vault: Address) -> Result<PendingTransaction> {
        self.submit(vault, ILeveragedVault::leverageCall::new(()), U256::ZERO)
            .await
    }

    async fn deposit_underlying(&self, vault: Address, value: U256) -> Result<PendingTransaction> {
        self.submit(vault, ILeveragedVault::depositUnderlyingCall::new(()), value)
            .await
    }
}
