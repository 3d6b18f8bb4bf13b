//! Multicall3 transport
//!
//! One `aggregate3` eth_call per batch. Every sub-call is sent with
//! `allowFailure = true`, so a reverting balance check comes back as
//! `success = false` instead of failing the whole batch.

use alloy_primitives::{address, Address};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use std::time::Duration;
use tracing::trace;

use crate::error::{DetectorError, Result};

sol! {
    /// Multicall3 - deployed at same address on all EVM chains
    interface IMulticall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls)
            external payable returns (Result[] memory returnData);
    }

    interface IBalanceOf {
        function balanceOf(address account) external view returns (uint256);
    }
}

/// Multicall3 address (same on all EVM chains)
pub const MULTICALL3: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

/// Maximum calls per batch (to avoid gas limits)
pub const MAX_CALLS_PER_BATCH: usize = 100;

/// Executes one aggregated batch on one chain
#[async_trait]
pub trait BatchCaller: Send + Sync {
    async fn aggregate3(&self, calls: Vec<IMulticall3::Call3>) -> Result<Vec<IMulticall3::Result>>;
}

/// `balanceOf(account)` against `token`, allowed to fail
pub fn balance_of_call(token: Address, account: Address) -> IMulticall3::Call3 {
    IMulticall3::Call3 {
        target: token,
        allowFailure: true,
        callData: IBalanceOf::balanceOfCall { account }.abi_encode().into(),
    }
}

/// Multicall3 over JSON-RPC HTTP, each batch bounded by `timeout`
pub struct Multicall3Client {
    rpc_url: String,
    timeout: Duration,
}

impl Multicall3Client {
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl BatchCaller for Multicall3Client {
    async fn aggregate3(&self, calls: Vec<IMulticall3::Call3>) -> Result<Vec<IMulticall3::Result>> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let url = self
            .rpc_url
            .parse()
            .map_err(|e| DetectorError::Config(format!("invalid RPC url: {}", e)))?;
        let provider = ProviderBuilder::new().connect_http(url);

        let count = calls.len();
        let calldata = IMulticall3::aggregate3Call { calls }.abi_encode();
        let tx = TransactionRequest::default()
            .to(MULTICALL3)
            .input(calldata.into());

        let result = tokio::time::timeout(self.timeout, provider.call(tx))
            .await
            .map_err(|_| DetectorError::Timeout(self.timeout))??;

        let decoded = IMulticall3::aggregate3Call::abi_decode_returns(&result)
            .map_err(|e| DetectorError::Multicall(format!("failed to decode result: {}", e)))?;

        if decoded.len() != count {
            return Err(DetectorError::Multicall(format!(
                "expected {} results, got {}",
                count,
                decoded.len()
            )));
        }

        trace!("Multicall3 returned {} results", decoded.len());
        Ok(decoded)
    }
}
