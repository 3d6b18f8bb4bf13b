//! The detection pipeline
//!
//! Each call is one invocation: read state, compute, write state. The host
//! (CLI, bot runtime) is expected to run invocations one at a time.
//!
//! Transaction flow:
//! - LogScanner picks scam-token transfers out of the logs
//! - HolderVerifier checks every receiver against the reference asset
//! - SpamScoreTracker counts one incident per holder hit, in log order
//! - StateStore persists registry + counters

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::assets::{Chain, ReferenceAsset};
use crate::config::Config;
use crate::error::{DetectorError, Result};
use crate::intel::{
    AlertDisposition, AlertPageSource, FeedFetcher, FeedResult, GraphqlAlertFeed, PeerAlert,
    ScamTokenRegistry, PHISHING_TOKEN_NEW, SPAM_TOKEN_NEW,
};
use crate::scanner::{scan_logs, LogEntry};
use crate::scoring::{Finding, SpamScoreTracker};
use crate::state::{JsonStateStore, PersistedState, StateStore};
use crate::verifier::HolderVerifier;

/// Logs of one transaction on one chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEvent {
    pub chain_id: u64,
    #[serde(default)]
    pub hash: Option<B256>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

/// Alerts the host should route to `handle_alert`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSubscription {
    pub source_id: String,
    pub alert_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct InitReport {
    pub subscription: AlertSubscription,
    pub known_tokens: usize,
    pub added_tokens: usize,
    pub feed: FeedResult,
}

pub struct Detector<S> {
    store: S,
    feed: FeedFetcher<Arc<dyn AlertPageSource>>,
    verifier: HolderVerifier,
    asset: ReferenceAsset,
    peer_source_id: String,
    feed_queries: Vec<String>,
}

impl Detector<JsonStateStore> {
    /// Wire the production pipeline; fails on a bad configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let asset = config.asset().ok_or_else(|| {
            DetectorError::Config(format!("Unknown reference asset {}", config.reference_asset))
        })?;
        let feed = GraphqlAlertFeed::new(config.feed_api_url.clone(), config.http_timeout())?;

        Ok(Self::new(
            config.state_store(),
            Arc::new(feed),
            HolderVerifier::from_rpc_urls(
                &config.rpc_mainnet,
                &config.rpc_polygon,
                config.http_timeout(),
            ),
            asset,
        )
        .with_peer_source(config.peer_source_id.clone())
        .with_feed_queries(config.feed_queries.clone())
        .with_page_limit(config.feed_page_limit))
    }
}

impl<S: StateStore> Detector<S> {
    pub fn new(
        store: S,
        feed: Arc<dyn AlertPageSource>,
        verifier: HolderVerifier,
        asset: ReferenceAsset,
    ) -> Self {
        let defaults = Config::default();
        Self {
            store,
            feed: FeedFetcher::new(feed, defaults.feed_page_limit),
            verifier,
            asset,
            peer_source_id: defaults.peer_source_id,
            feed_queries: defaults.feed_queries,
        }
    }

    pub fn with_peer_source(mut self, source_id: impl Into<String>) -> Self {
        self.peer_source_id = source_id.into();
        self
    }

    pub fn with_feed_queries(mut self, queries: Vec<String>) -> Self {
        self.feed_queries = queries;
        self
    }

    pub fn with_page_limit(mut self, limit: usize) -> Self {
        self.feed = self.feed.with_limit(limit);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn asset(&self) -> &ReferenceAsset {
        &self.asset
    }

    pub fn subscription(&self) -> AlertSubscription {
        AlertSubscription {
            source_id: self.peer_source_id.clone(),
            alert_ids: vec![SPAM_TOKEN_NEW.to_string(), PHISHING_TOKEN_NEW.to_string()],
        }
    }

    /// Current persisted state (empty on first run)
    pub fn snapshot(&self) -> Result<PersistedState> {
        self.store.read_or_default()
    }

    /// Seed the registry from the alert feed, keeping existing counters
    pub async fn initialize(&self) -> Result<InitReport> {
        let source_ids = vec![self.peer_source_id.clone()];
        let feed = self.feed.fetch_many(&self.feed_queries, &source_ids).await;
        if !feed.complete {
            warn!("Alert feed was only partially read, continuing with what we have");
        }

        let mut state = self.store.read_or_default()?;
        let mut registry = ScamTokenRegistry::from_set(std::mem::take(&mut state.scam_tokens));
        let added_tokens = registry.merge(feed.tokens.iter().copied());
        let known_tokens = registry.len();
        state.scam_tokens = registry.into_set();

        self.store.write(&state)?;

        info!(
            "✓ Initialized with {} known scam tokens ({} new)",
            known_tokens, added_tokens
        );

        Ok(InitReport {
            subscription: self.subscription(),
            known_tokens,
            added_tokens,
            feed,
        })
    }

    /// Scan one transaction and score the senders that hit real holders
    ///
    /// A failed state write is logged and the findings are still returned.
    pub async fn handle_transaction(&self, tx: &TransactionEvent) -> Result<Vec<Finding>> {
        let mut state = self.store.read_or_default()?;

        let registry = ScamTokenRegistry::from_set(std::mem::take(&mut state.scam_tokens));
        let transfers = scan_logs(&tx.logs, &registry);
        state.scam_tokens = registry.into_set();

        debug!(
            "Tx {:?} on chain {}: {} scam-token transfers",
            tx.hash,
            tx.chain_id,
            transfers.len()
        );

        let mut findings = Vec::new();

        match Chain::from_id(tx.chain_id) {
            Some(chain) if !transfers.is_empty() => {
                let receivers: Vec<Address> = transfers.iter().map(|t| t.receiver).collect();
                let classifications = self
                    .verifier
                    .classify(&self.asset.deployments, &receivers)
                    .await;

                // Counters are applied one receiver at a time, in log order
                let mut tracker =
                    SpamScoreTracker::new(std::mem::take(&mut state.spammer_addresses));
                for (transfer, class) in transfers.iter().zip(&classifications) {
                    if !class.is_holder {
                        continue;
                    }
                    let confidence = tracker.record_incident(transfer.sender);
                    findings.push(Finding::spammed_holder(
                        transfer,
                        chain,
                        confidence,
                        &self.asset,
                    ));
                }
                state.spammer_addresses = tracker.into_table();
            }
            Some(_) => {}
            None => warn!(
                "Chain {} has no legit {} assets, skipping detection",
                tx.chain_id, self.asset.symbol
            ),
        }

        if !findings.is_empty() {
            info!("🚨 {} findings in tx {:?}", findings.len(), tx.hash);
        }

        if let Err(e) = self.store.write(&state) {
            error!(
                "Failed to persist state after tx {:?} ({} findings still emitted): {}",
                tx.hash,
                findings.len(),
                e
            );
        }

        Ok(findings)
    }

    /// Merge scam tokens announced by the peer detector
    ///
    /// Never produces findings; other alerts are logged and ignored.
    pub async fn handle_alert(&self, alert: &PeerAlert) -> Result<Vec<Finding>> {
        match alert.disposition(&self.peer_source_id) {
            AlertDisposition::ScamToken(raw) => {
                let mut state = self.store.read_or_default()?;
                let mut registry =
                    ScamTokenRegistry::from_set(std::mem::take(&mut state.scam_tokens));

                match registry.insert_str(&raw) {
                    Ok(true) => info!("Found new scam token: {}", raw),
                    Ok(false) => debug!("Scam token {} already known", raw),
                    Err(e) => {
                        warn!("Ignoring alert {:?}: {}", alert.alert_hash, e);
                        return Ok(Vec::new());
                    }
                }

                debug!("Scam token set size is now {}", registry.len());
                state.scam_tokens = registry.into_set();
                self.store.write(&state)?;
            }
            AlertDisposition::MissingToken => warn!(
                "Alert {} ({:?}) carries no tokenAddress",
                alert.alert_id, alert.alert_hash
            ),
            AlertDisposition::UnknownAlert => warn!(
                "Unknown AlertId: {} hash: {:?}",
                alert.alert_id, alert.alert_hash
            ),
            AlertDisposition::ForeignSource => debug!(
                "Ignoring alert {} from {}",
                alert.alert_id, alert.source_id
            ),
        }

        Ok(Vec::new())
    }
}
