//! Alert Feed Fetcher - past scam tokens from the alert explorer
//!
//! Pages through the explorer's GraphQL alert search and pulls the token
//! address out of each alert's free-text description.
//!
//! API: POST https://explorer-api.forta.network/graphql (RetrieveAlerts)

use alloy_primitives::Address;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{DetectorError, Result};

// ============================================
// CONSTANTS
// ============================================

/// Alert explorer GraphQL endpoint
pub const DEFAULT_FEED_URL: &str = "https://explorer-api.forta.network/graphql";

/// Alerts per page; a shorter page means we reached the end
pub const DEFAULT_PAGE_LIMIT: usize = 100;

const RETRIEVE_ALERTS_QUERY: &str = r#"query RetrieveAlerts($getListInput: GetAlertsInput) {
  getList(input: $getListInput) {
    alerts {
      hash
      description
      alert_id
    }
    nextPageValues {
      timestamp
      id
    }
  }
}"#;

lazy_static! {
    /// Lowercase hex only, as the detector bots write them
    static ref ADDRESS_PATTERN: Regex =
        Regex::new(r"0x[a-f0-9]{40}").expect("address pattern compiles");
}

// ============================================
// PAGE TYPES
// ============================================

/// Opaque pagination cursor, echoed back verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageCursor {
    pub id: Value,
    pub timestamp: Value,
}

#[derive(Debug, Clone)]
pub struct PageRequest<'a> {
    pub query: &'a str,
    pub source_ids: &'a [String],
    pub limit: usize,
    pub cursor: Option<PageCursor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedAlert {
    pub hash: Option<String>,
    pub description: Option<String>,
    pub alert_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AlertPage {
    pub alerts: Vec<FeedAlert>,
    pub next_cursor: Option<PageCursor>,
}

/// Where pages come from
///
/// `Ok(None)` means the feed returned no list at all, which ends paging.
#[async_trait]
pub trait AlertPageSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Option<AlertPage>>;
}

#[async_trait]
impl<T: AlertPageSource + ?Sized> AlertPageSource for Arc<T> {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Option<AlertPage>> {
        (**self).fetch_page(request).await
    }
}

// ============================================
// GRAPHQL SOURCE
// ============================================

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<GraphqlData>,
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlData {
    #[serde(rename = "getList")]
    get_list: Option<GetList>,
}

#[derive(Debug, Deserialize)]
struct GetList {
    #[serde(default)]
    alerts: Vec<FeedAlert>,
    #[serde(rename = "nextPageValues")]
    next_page_values: Option<PageCursor>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

pub struct GraphqlAlertFeed {
    http_client: Client,
    url: String,
}

impl GraphqlAlertFeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            url: url.into(),
        })
    }

    fn request_body(request: &PageRequest<'_>) -> Result<Value> {
        Ok(json!({
            "query": RETRIEVE_ALERTS_QUERY,
            "variables": {
                "getListInput": {
                    "severity": [],
                    "addresses": [],
                    "text": request.query,
                    "agents": serde_json::to_string(request.source_ids)?,
                    "sort": "desc",
                    "muted": [],
                    "txHash": "",
                    "limit": request.limit,
                    "pageValues": request.cursor,
                }
            }
        }))
    }
}

#[async_trait]
impl AlertPageSource for GraphqlAlertFeed {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Option<AlertPage>> {
        let body = Self::request_body(request)?;

        let response: GraphqlResponse = self
            .http_client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Self::into_page(response)
    }
}

impl GraphqlAlertFeed {
    /// Errors only fail the page when no data came with them
    fn into_page(response: GraphqlResponse) -> Result<Option<AlertPage>> {
        if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
            if response.data.is_none() {
                let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
                return Err(DetectorError::Feed(messages.join("; ")));
            }
        }

        Ok(response.data.and_then(|d| d.get_list).map(|list| AlertPage {
            alerts: list.alerts,
            next_cursor: list.next_page_values,
        }))
    }
}

// ============================================
// FETCHER
// ============================================

/// What one or more paging runs produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedResult {
    pub tokens: BTreeSet<Address>,
    pub pages: usize,
    pub alerts: usize,

    /// False when paging stopped on an error
    pub complete: bool,
}

impl FeedResult {
    fn absorb(&mut self, other: FeedResult) {
        self.tokens.extend(other.tokens);
        self.pages += other.pages;
        self.alerts += other.alerts;
        self.complete &= other.complete;
    }
}

/// First address in an alert description is the token of record
pub fn extract_token_address(description: &str) -> Option<Address> {
    let mut matches = ADDRESS_PATTERN.find_iter(description);
    let first = matches.next()?;

    if matches.next().is_some() {
        warn!(
            "Unexpected number of addresses in alert description, using {}",
            first.as_str()
        );
    }

    Address::from_str(first.as_str()).ok()
}

pub struct FeedFetcher<S> {
    source: S,
    limit: usize,
}

impl<S: AlertPageSource> FeedFetcher<S> {
    pub fn new(source: S, limit: usize) -> Self {
        Self {
            source,
            limit: limit.max(1),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Page through every alert matching `query` from `source_ids`
    ///
    /// Never fails: a page error stops paging and keeps what was collected.
    pub async fn fetch_scam_tokens(&self, query: &str, source_ids: &[String]) -> FeedResult {
        let mut result = FeedResult::default();
        let mut cursor: Option<PageCursor> = None;

        loop {
            let request = PageRequest {
                query,
                source_ids,
                limit: self.limit,
                cursor: cursor.clone(),
            };

            let page = match self.source.fetch_page(&request).await {
                Ok(Some(page)) => page,
                Ok(None) => {
                    debug!("Feed returned no list for '{}', done", query);
                    result.complete = true;
                    break;
                }
                Err(e) => {
                    warn!(
                        "Feed page {} for '{}' failed, keeping {} tokens: {}",
                        result.pages + 1,
                        query,
                        result.tokens.len(),
                        e
                    );
                    break;
                }
            };

            let count = page.alerts.len();
            result.pages += 1;
            result.alerts += count;

            for alert in &page.alerts {
                match alert.description.as_deref().and_then(extract_token_address) {
                    Some(token) => {
                        result.tokens.insert(token);
                    }
                    None => debug!("No token address in alert {:?}", alert.hash),
                }
            }

            debug!("Feed page {}: {} alerts", result.pages, count);

            if count < self.limit {
                result.complete = true;
                break;
            }

            match page.next_cursor {
                // A cursor that does not move would page forever
                Some(next) if cursor.as_ref() != Some(&next) => cursor = Some(next),
                _ => {
                    warn!("Feed for '{}' stopped advancing after page {}", query, result.pages);
                    result.complete = true;
                    break;
                }
            }
        }

        info!(
            "📡 Feed '{}': {} tokens from {} alerts over {} pages",
            query,
            result.tokens.len(),
            result.alerts,
            result.pages
        );
        result
    }

    /// Run several queries and union the tokens
    pub async fn fetch_many(&self, queries: &[String], source_ids: &[String]) -> FeedResult {
        let mut merged = FeedResult {
            complete: true,
            ..FeedResult::default()
        };
        for query in queries {
            merged.absorb(self.fetch_scam_tokens(query, source_ids).await);
        }
        merged
    }
}
