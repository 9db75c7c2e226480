//! Contract interfaces used by the session store
//!
//! The vault and the alchemist are reached through [`VaultApi`] and
//! [`YieldApi`]. Every method takes the contract address so callers pick
//! it from the active [`AddressBook`](crate::addresses::AddressBook).

pub mod alchemist;
pub mod vault;

use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolEvent};
use async_trait::async_trait;

use crate::error::Result;
use crate::provider::{Log, PendingTransaction};

pub use alchemist::RpcAlchemist;
pub use vault::RpcVault;

sol! {
    interface ILeveragedVault {
        event DepositUnderlying(address indexed sender, address indexed underlyingToken, uint256 amount);

        function balanceOf(address account) external view returns (uint256);
        function convertSharesToUnderlyingTokens(uint256 shares) external view returns (uint256);
        function getVaultDepositedBalance() external view returns (uint256);
        function leverage() external;
        function depositUnderlying() external payable returns (uint256 shares);
    }

    interface IAlchemistV2 {
        struct YieldTokenParams {
            uint8 decimals;
            address underlyingToken;
            address adapter;
            uint256 maximumLoss;
            uint256 maximumExpectedValue;
            uint256 creditUnlockRate;
            uint256 activeBalance;
            uint256 harvestableBalance;
            uint256 totalShares;
            uint256 expectedValue;
            uint256 pendingCredit;
            uint256 distributedCredit;
            uint256 lastDistributionBlock;
            uint256 accruedWeight;
            bool enabled;
        }

        function getYieldTokenParameters(address yieldToken) external view returns (YieldTokenParams memory params);
    }
}

/// Yield token configuration held by the alchemist
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YieldTokenParams {
    pub decimals: u8,
    pub underlying_token: Address,
    pub adapter: Address,
    pub maximum_loss: U256,
    /// Ceiling on the yield token's expected value; the session's max mint
    pub maximum_expected_value: U256,
    pub credit_unlock_rate: U256,
    pub active_balance: U256,
    pub harvestable_balance: U256,
    pub total_shares: U256,
    pub expected_value: U256,
    pub pending_credit: U256,
    pub distributed_credit: U256,
    pub last_distribution_block: U256,
    pub accrued_weight: U256,
    pub enabled: bool,
}

impl YieldTokenParams {
    pub fn max_mint(&self) -> U256 {
        self.maximum_expected_value
    }
}

impl From<IAlchemistV2::YieldTokenParams> for YieldTokenParams {
    fn from(p: IAlchemistV2::YieldTokenParams) -> Self {
        Self {
            decimals: p.decimals,
            underlying_token: p.underlyingToken,
            adapter: p.adapter,
            maximum_loss: p.maximumLoss,
            maximum_expected_value: p.maximumExpectedValue,
            credit_unlock_rate: p.creditUnlockRate,
            active_balance: p.activeBalance,
            harvestable_balance: p.harvestableBalance,
            total_shares: p.totalShares,
            expected_value: p.expectedValue,
            pending_credit: p.pendingCredit,
            distributed_credit: p.distributedCredit,
            last_distribution_block: p.lastDistributionBlock,
            accrued_weight: p.accruedWeight,
            enabled: p.enabled,
        }
    }
}

/// Decoded `DepositUnderlying` event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositEvent {
    pub sender: Address,
    pub underlying_token: Address,
    pub amount: U256,
}

impl DepositEvent {
    /// Decode a vault log; `None` when it is some other event
    pub fn from_log(log: &Log) -> Option<Self> {
        let event =
            ILeveragedVault::DepositUnderlying::decode_raw_log(log.topics.iter().copied(), &log.data)
                .ok()?;

        Some(Self {
            sender: event.sender,
            underlying_token: event.underlyingToken,
            amount: event.amount,
        })
    }
}

/// Leveraged vault
#[async_trait]
pub trait VaultApi: Send + Sync {
    /// Vault shares held by `owner`
    async fn balance_of(&self, vault: Address, owner: Address) -> Result<U256>;

    async fn convert_shares_to_underlying_tokens(&self, vault: Address, shares: U256)
        -> Result<U256>;

    /// Total underlying deposited in the vault
    async fn get_vault_deposited_balance(&self, vault: Address) -> Result<U256>;

    async fn leverage(&self, vault: Address) -> Result<PendingTransaction>;

    /// Payable deposit of `value` wei of the native asset
    async fn deposit_underlying(&self, vault: Address, value: U256) -> Result<PendingTransaction>;
}

/// Yield-protocol integration
#[async_trait]
pub trait YieldApi: Send + Sync {
    async fn get_yield_token_parameters(
        &self,
        alchemist: Address,
        yield_token: Address,
    ) -> Result<YieldTokenParams>;
}
