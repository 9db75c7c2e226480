//! Alchemist (yield integration) over a wallet provider

use std::sync::Arc;

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use async_trait::async_trait;

use crate::error::Result;
use crate::provider::WalletProvider;

use super::{IAlchemistV2, YieldApi, YieldTokenParams};

/// [`YieldApi`] that ABI-encodes calls and runs them through the provider
pub struct RpcAlchemist {
    provider: Arc<dyn WalletProvider>,
}

impl RpcAlchemist {
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self { provider }
    }
}

/// Decode the raw `getYieldTokenParameters` return data
pub fn decode_yield_token_parameters(data: &[u8]) -> Result<YieldTokenParams> {
    let params = IAlchemistV2::getYieldTokenParametersCall::abi_decode_returns(data)?;
    Ok(params.into())
}

#[async_trait]
impl YieldApi for RpcAlchemist {
    async fn get_yield_token_parameters(
        &self,
        alchemist: Address,
        yield_token: Address,
    ) -> Result<YieldTokenParams> {
        let call = IAlchemistV2::getYieldTokenParametersCall::new((yield_token,));
        let output = self
            .provider
            .call(alchemist, Bytes::from(call.abi_encode()))
            .await?;
        decode_yield_token_parameters(&output)
    }
}
