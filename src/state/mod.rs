//! Persisted detector state
//!
//! One JSON object holds everything that must survive between invocations:
//! the known scam tokens and the per-sender incident counters. Every
//! invocation is a read-modify-write of the whole object; the host runtime
//! serializes invocations, so there is no in-process locking on top.

mod store;

pub use store::{JsonStateStore, MemoryStateStore};

use alloy_primitives::Address;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::Result;
use crate::scoring::SpamScoreTable;

/// The state file contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub scam_tokens: BTreeSet<Address>,

    /// Unix milliseconds of the last successful write, as a decimal string
    #[serde(default)]
    pub updated_at: String,

    #[serde(default)]
    pub spammer_addresses: SpamScoreTable,
}

impl PersistedState {
    /// Stamp `updated_at` with the current time
    pub fn touch(&mut self) {
        self.updated_at = Utc::now().timestamp_millis().to_string();
    }

    pub fn updated_at_datetime(&self) -> Option<DateTime<Utc>> {
        let millis: i64 = self.updated_at.parse().ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }
}

/// Key-value persistence consumed by the detector
///
/// `read` returns `Ok(None)` when nothing was ever written. `write` stamps
/// `updated_at` on what it stores.
pub trait StateStore: Send + Sync {
    fn read(&self) -> Result<Option<PersistedState>>;

    fn write(&self, state: &PersistedState) -> Result<()>;

    /// Read, synthesizing an empty state on first run
    fn read_or_default(&self) -> Result<PersistedState> {
        Ok(self.read()?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_json_shape_matches_state_file() {
        let raw = r#"{
            "scamTokens": ["0x1111111111111111111111111111111111111111"],
            "updatedAt": "1690000000000",
            "spammerAddresses": {"0x2222222222222222222222222222222222222222": 3}
        }"#;

        let state: PersistedState = serde_json::from_str(raw).unwrap();
        assert!(state
            .scam_tokens
            .contains(&address!("1111111111111111111111111111111111111111")));
        assert_eq!(
            state
                .spammer_addresses
                .get(&address!("2222222222222222222222222222222222222222")),
            3
        );
        assert_eq!(
            state.updated_at_datetime().map(|d| d.timestamp()),
            Some(1_690_000_000)
        );

        let back = serde_json::to_value(&state).unwrap();
        assert!(back.get("scamTokens").is_some());
        assert!(back.get("spammerAddresses").is_some());
    }

    #[test]
    fn test_missing_fields_default() {
        let state: PersistedState = serde_json::from_str("{}").unwrap();
        assert!(state.scam_tokens.is_empty());
        assert!(state.spammer_addresses.is_empty());
        assert!(state.updated_at_datetime().is_none());
    }
}
