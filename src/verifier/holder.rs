//! Holder Verifier
//!
//! Asks every deployment of the reference asset for the receivers' balances,
//! one Multicall3 batch per chain, and calls an address a holder if any
//! deployment reports a positive balance.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::multicall::{balance_of_call, BatchCaller, IBalanceOf, Multicall3Client, MAX_CALLS_PER_BATCH};
use crate::assets::{Chain, ContractRef};

/// Verdict for one receiver across all queried deployments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HolderClassification {
    pub address: Address,
    pub is_holder: bool,

    /// False when no deployment answered for this address
    pub resolved: bool,
}

/// Balances from one deployment, `None` where the call failed
#[derive(Debug)]
struct TargetBalances {
    target: ContractRef,
    balances: Vec<Option<U256>>,
}

impl TargetBalances {
    fn failed(&self) -> usize {
        self.balances.iter().filter(|b| b.is_none()).count()
    }
}

pub struct HolderVerifier {
    callers: HashMap<Chain, Arc<dyn BatchCaller>>,
    max_calls_per_batch: usize,
}

impl Default for HolderVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl HolderVerifier {
    pub fn new() -> Self {
        Self {
            callers: HashMap::new(),
            max_calls_per_batch: MAX_CALLS_PER_BATCH,
        }
    }

    /// Multicall3 over HTTP on both supported chains
    pub fn from_rpc_urls(mainnet_rpc: &str, polygon_rpc: &str, timeout: Duration) -> Self {
        Self::new()
            .with_caller(
                Chain::Mainnet,
                Arc::new(Multicall3Client::new(mainnet_rpc, timeout)),
            )
            .with_caller(
                Chain::Polygon,
                Arc::new(Multicall3Client::new(polygon_rpc, timeout)),
            )
    }

    pub fn with_caller(mut self, chain: Chain, caller: Arc<dyn BatchCaller>) -> Self {
        self.callers.insert(chain, caller);
        self
    }

    pub fn with_max_calls_per_batch(mut self, max: usize) -> Self {
        self.max_calls_per_batch = max.max(1);
        self
    }

    /// Classify every address; output order and length match `addresses`
    ///
    /// RPC trouble never surfaces as an error: the affected addresses are
    /// reported unresolved (and therefore not holders).
    pub async fn classify(
        &self,
        targets: &[ContractRef],
        addresses: &[Address],
    ) -> Vec<HolderClassification> {
        if addresses.is_empty() {
            return Vec::new();
        }

        info!(
            "🔎 Fetching balances of {} addresses on {} deployments",
            addresses.len(),
            targets.len()
        );

        let per_target = join_all(
            targets
                .iter()
                .map(|target| self.query_target(*target, addresses)),
        )
        .await;

        let failed: usize = per_target.iter().map(TargetBalances::failed).sum();
        if failed > 0 {
            warn!(
                "Some balances could not be fetched: {} of {} calls failed",
                failed,
                addresses.len() * targets.len()
            );
            for outcome in per_target.iter().filter(|o| o.failed() > 0) {
                debug!(
                    "  {} on {}: {} failed",
                    outcome.target.address,
                    outcome.target.chain,
                    outcome.failed()
                );
            }
        }

        addresses
            .iter()
            .enumerate()
            .map(|(i, address)| {
                let known: Vec<U256> = per_target.iter().filter_map(|t| t.balances[i]).collect();
                HolderClassification {
                    address: *address,
                    is_holder: known.iter().any(|b| *b > U256::ZERO),
                    resolved: !known.is_empty(),
                }
            })
            .collect()
    }

    async fn query_target(&self, target: ContractRef, addresses: &[Address]) -> TargetBalances {
        let mut balances = vec![None; addresses.len()];

        let Some(caller) = self.callers.get(&target.chain) else {
            warn!("No RPC configured for {}, skipping {}", target.chain, target.address);
            return TargetBalances { target, balances };
        };

        for (chunk_idx, chunk) in addresses.chunks(self.max_calls_per_batch).enumerate() {
            let offset = chunk_idx * self.max_calls_per_batch;
            let calls = chunk
                .iter()
                .map(|account| balance_of_call(target.address, *account))
                .collect();

            let results = match caller.aggregate3(calls).await {
                Ok(results) => results,
                Err(e) => {
                    warn!(
                        "Multicall on {} failed for {} addresses: {}",
                        target.chain,
                        chunk.len(),
                        e
                    );
                    continue;
                }
            };

            for (i, result) in results.iter().enumerate().take(chunk.len()) {
                if !result.success {
                    continue;
                }
                balances[offset + i] =
                    IBalanceOf::balanceOfCall::abi_decode_returns(&result.returnData).ok();
            }
        }

        TargetBalances { target, balances }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::super::multicall::IMulticall3;
    use super::*;
    use crate::error::{DetectorError, Result};
    use alloy_primitives::{address, Bytes};
    use alloy_sol_types::SolValue;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers balanceOf from a table; listed accounts revert
    pub(crate) struct FakeChain {
        pub balances: HashMap<Address, U256>,
        pub reverts: Vec<Address>,
        pub down: bool,
        pub batches: AtomicUsize,
    }

    impl FakeChain {
        pub(crate) fn new(balances: &[(Address, u64)]) -> Self {
            Self {
                balances: balances.iter().map(|(a, b)| (*a, U256::from(*b))).collect(),
                reverts: Vec::new(),
                down: false,
                batches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BatchCaller for FakeChain {
        async fn aggregate3(
            &self,
            calls: Vec<IMulticall3::Call3>,
        ) -> Result<Vec<IMulticall3::Result>> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            if self.down {
                return Err(DetectorError::Multicall("connection refused".to_string()));
            }
            Ok(calls
                .iter()
                .map(|call| {
                    let decoded = IBalanceOf::balanceOfCall::abi_decode(&call.callData)
                        .expect("balanceOf calldata");
                    if self.reverts.contains(&decoded.account) {
                        return IMulticall3::Result {
                            success: false,
                            returnData: Bytes::new(),
                        };
                    }
                    let balance = self
                        .balances
                        .get(&decoded.account)
                        .copied()
                        .unwrap_or(U256::ZERO);
                    IMulticall3::Result {
                        success: true,
                        returnData: balance.abi_encode().into(),
                    }
                })
                .collect())
        }
    }

    const SAND_MAINNET: ContractRef = ContractRef {
        chain: Chain::Mainnet,
        address: address!("3845badade8e6dff049820680d1f14bd3903a5d0"),
    };
    const SAND_POLYGON: ContractRef = ContractRef {
        chain: Chain::Polygon,
        address: address!("bbba073c31bf03b8acf7c28ef0738decf3695683"),
    };

    fn accounts(n: u8) -> Vec<Address> {
        (1..=n).map(Address::repeat_byte).collect()
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_every_address() {
        let a = accounts(5);
        let mut chain = FakeChain::new(&[(a[0], 10), (a[1], 10), (a[2], 0), (a[3], 7), (a[4], 1)]);
        chain.reverts = vec![a[1], a[3]];

        let verifier = HolderVerifier::new().with_caller(Chain::Mainnet, Arc::new(chain));
        let results = verifier.classify(&[SAND_MAINNET], &a).await;

        assert_eq!(results.len(), 5);
        let holders: Vec<bool> = results.iter().map(|r| r.is_holder).collect();
        assert_eq!(holders, vec![true, false, false, false, true]);
        let resolved: Vec<bool> = results.iter().map(|r| r.resolved).collect();
        assert_eq!(resolved, vec![true, false, true, false, true]);
        assert_eq!(results[2].address, a[2]);
    }

    #[tokio::test]
    async fn test_holding_on_either_chain_counts() {
        let a = accounts(3);
        let mainnet = FakeChain::new(&[(a[0], 5)]);
        let polygon = FakeChain::new(&[(a[1], 5)]);

        let verifier = HolderVerifier::new()
            .with_caller(Chain::Mainnet, Arc::new(mainnet))
            .with_caller(Chain::Polygon, Arc::new(polygon));
        let results = verifier.classify(&[SAND_MAINNET, SAND_POLYGON], &a).await;

        let holders: Vec<bool> = results.iter().map(|r| r.is_holder).collect();
        assert_eq!(holders, vec![true, true, false]);
        assert!(results.iter().all(|r| r.resolved));
    }

    #[tokio::test]
    async fn test_dead_chain_degrades_to_other_chain() {
        let a = accounts(2);
        let mut mainnet = FakeChain::new(&[(a[0], 5)]);
        mainnet.down = true;
        let polygon = FakeChain::new(&[(a[1], 5)]);

        let verifier = HolderVerifier::new()
            .with_caller(Chain::Mainnet, Arc::new(mainnet))
            .with_caller(Chain::Polygon, Arc::new(polygon));
        let results = verifier.classify(&[SAND_MAINNET, SAND_POLYGON], &a).await;

        assert!(!results[0].is_holder);
        assert!(results[0].resolved);
        assert!(results[1].is_holder);
    }

    #[tokio::test]
    async fn test_batches_are_chunked() {
        let a = accounts(7);
        let chain = Arc::new(FakeChain::new(&[(a[6], 1)]));

        let verifier = HolderVerifier::new()
            .with_caller(Chain::Mainnet, chain.clone())
            .with_max_calls_per_batch(3);
        let results = verifier.classify(&[SAND_MAINNET], &a).await;

        assert_eq!(chain.batches.load(Ordering::SeqCst), 3);
        assert!(results[6].is_holder);
        assert!(results[..6].iter().all(|r| !r.is_holder && r.resolved));
    }

    #[tokio::test]
    async fn test_missing_caller_is_unresolved() {
        let a = accounts(1);
        let results = HolderVerifier::new().classify(&[SAND_POLYGON], &a).await;
        assert_eq!(
            results,
            vec![HolderClassification {
                address: a[0],
                is_holder: false,
                resolved: false
            }]
        );
    }

    #[test]
    fn test_no_addresses_no_calls() {
        let chain = Arc::new(FakeChain::new(&[]));
        let verifier = HolderVerifier::new().with_caller(Chain::Mainnet, chain.clone());

        let results = tokio_test::block_on(verifier.classify(&[SAND_MAINNET], &[]));

        assert!(results.is_empty());
        assert_eq!(chain.batches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stalled_rpcs_leave_addresses_unresolved() {
        let url = crate::verifier::multicall_fixtures::silent_rpc().await;
        let verifier =
            HolderVerifier::from_rpc_urls(&url, &url, std::time::Duration::from_millis(200));
        let a = accounts(2);

        let results = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            verifier.classify(&[SAND_MAINNET, SAND_POLYGON], &a),
        )
        .await
        .expect("classify returns once the RPC timeout fires");

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.is_holder && !r.resolved));
    }
}
