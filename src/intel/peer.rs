use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SPAM_TOKEN_NEW: &str = "SPAM-TOKEN-NEW";
pub const PHISHING_TOKEN_NEW: &str = "PHISHING-TOKEN-NEW";

/// Alert pushed by a peer detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerAlert {
    pub source_id: String,
    pub alert_id: String,
    #[serde(default)]
    pub alert_hash: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// What to do with a peer alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertDisposition {
    /// Recognized scam-token announcement carrying this raw address
    ScamToken(String),

    /// Recognized alert id without a `tokenAddress`
    MissingToken,

    /// Right source, alert id we do not handle
    UnknownAlert,

    /// Not from the peer we subscribe to
    ForeignSource,
}

impl PeerAlert {
    pub fn token_address(&self) -> Option<&str> {
        self.metadata.get("tokenAddress").map(String::as_str)
    }

    pub fn disposition(&self, peer_source_id: &str) -> AlertDisposition {
        if !self.source_id.eq_ignore_ascii_case(peer_source_id) {
            return AlertDisposition::ForeignSource;
        }

        match self.alert_id.as_str() {
            SPAM_TOKEN_NEW | PHISHING_TOKEN_NEW => match self.token_address() {
                Some(token) => AlertDisposition::ScamToken(token.to_string()),
                None => AlertDisposition::MissingToken,
            },
            _ => AlertDisposition::UnknownAlert,
        }
    }
}
