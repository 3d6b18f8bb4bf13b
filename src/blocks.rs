//! Block log source for the CLI runner
//!
//! Fetches every log of a block and regroups them per transaction so each
//! transaction goes through the detector on its own.

use alloy_primitives::B256;
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::{Filter, Log};
use std::future::IntoFuture;
use std::time::Duration;
use tracing::debug;

use crate::detector::TransactionEvent;
use crate::error::{DetectorError, Result};
use crate::scanner::LogEntry;

pub struct BlockLogFetcher {
    rpc_url: String,
    chain_id: u64,
    timeout: Duration,
}

impl BlockLogFetcher {
    pub fn new(rpc_url: impl Into<String>, chain_id: u64, timeout: Duration) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            chain_id,
            timeout,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn provider(&self) -> Result<impl Provider> {
        let url = self
            .rpc_url
            .parse()
            .map_err(|e| DetectorError::Config(format!("invalid RPC url: {}", e)))?;
        Ok(ProviderBuilder::new().connect_http(url))
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T>
    where
        F: IntoFuture<Output = std::result::Result<T, alloy_transport::TransportError>>,
    {
        Ok(tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| DetectorError::Timeout(self.timeout))??)
    }

    pub async fn latest_block(&self) -> Result<u64> {
        let provider = self.provider()?;
        self.bounded(provider.get_block_number()).await
    }

    /// Logs of `block`, one `TransactionEvent` per transaction in log order
    pub async fn transactions_in_block(&self, block: u64) -> Result<Vec<TransactionEvent>> {
        let filter = Filter::new().from_block(block).to_block(block);
        let provider = self.provider()?;
        let logs = self.bounded(provider.get_logs(&filter)).await?;

        debug!("Block {} on chain {}: {} logs", block, self.chain_id, logs.len());
        Ok(group_by_transaction(self.chain_id, &logs))
    }
}

/// Split logs into per-transaction events, keeping first-seen order
pub fn group_by_transaction(chain_id: u64, logs: &[Log]) -> Vec<TransactionEvent> {
    let mut events: Vec<TransactionEvent> = Vec::new();

    for log in logs {
        let hash: Option<B256> = log.transaction_hash;
        match events.iter_mut().find(|e| e.hash == hash) {
            Some(event) => event.logs.push(LogEntry::from(log)),
            None => events.push(TransactionEvent {
                chain_id,
                hash,
                logs: vec![LogEntry::from(log)],
            }),
        }
    }

    events
}
