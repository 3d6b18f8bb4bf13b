//! Scam-token intelligence
//!
//! Responsible for:
//! - The deduplicated registry of known scam tokens
//! - Seeding it from the alert explorer's history
//! - Peer alerts that announce new scam tokens

mod feed;
mod peer;
mod registry;

pub use feed::{
    extract_token_address, AlertPage, AlertPageSource, FeedAlert, FeedFetcher, FeedResult,
    GraphqlAlertFeed, PageCursor, PageRequest, DEFAULT_FEED_URL, DEFAULT_PAGE_LIMIT,
};
pub use peer::{AlertDisposition, PeerAlert, PHISHING_TOKEN_NEW, SPAM_TOKEN_NEW};
pub use registry::ScamTokenRegistry;

#[cfg(test)]
pub(crate) use feed::tests as feed_fixtures;
