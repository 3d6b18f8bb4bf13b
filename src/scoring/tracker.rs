//! Spammer scoring
//!
//! Every time a sender drops a scam token on a real holder, its incident
//! count goes up by one. The count is squashed through a slow sigmoid so the
//! confidence creeps toward 1 as incidents pile up.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Divides the incident count before the sigmoid
const CONFIDENCE_SCALE: f64 = 100.0;

/// Sender -> incident count, lazily created, never reset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpamScoreTable(BTreeMap<Address, u64>);

impl SpamScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Incident count, zero when the sender was never seen
    pub fn get(&self, sender: &Address) -> u64 {
        self.0.get(sender).copied().unwrap_or(0)
    }

    /// Add one incident and return the new count
    pub fn increment(&mut self, sender: Address) -> u64 {
        let count = self.0.entry(sender).or_insert(0);
        *count += 1;
        *count
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &u64)> {
        self.0.iter()
    }

    /// Senders with the most incidents first
    pub fn top(&self, n: usize) -> Vec<(Address, u64)> {
        let mut entries: Vec<(Address, u64)> = self.0.iter().map(|(a, c)| (*a, *c)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        entries.truncate(n);
        entries
    }
}

/// `1 / (1 + e^(-count/100))`
pub fn confidence(count: u64) -> f64 {
    let x = count as f64 / CONFIDENCE_SCALE;
    1.0 / (1.0 + (-x).exp())
}

/// Owns the score table for the duration of one invocation
#[derive(Debug, Clone, Default)]
pub struct SpamScoreTracker {
    table: SpamScoreTable,
}

impl SpamScoreTracker {
    pub fn new(table: SpamScoreTable) -> Self {
        Self { table }
    }

    /// Count one more incident for `sender` and return its confidence
    pub fn record_incident(&mut self, sender: Address) -> f64 {
        let count = self.table.increment(sender);
        let score = confidence(count);
        debug!("Sender {} now at {} incidents (confidence {:.4})", sender, count, score);
        score
    }

    pub fn count(&self, sender: &Address) -> u64 {
        self.table.get(sender)
    }

    pub fn table(&self) -> &SpamScoreTable {
        &self.table
    }

    pub fn into_table(self) -> SpamScoreTable {
        self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_confidence_curve() {
        assert!((confidence(1) - 0.5025).abs() < 1e-4);
        assert!((confidence(100) - 0.7311).abs() < 1e-4);
        assert!((confidence(1000) - 0.99995).abs() < 1e-5);
        assert!(confidence(1_000_000) <= 1.0);
    }

    #[test]
    fn test_confidence_never_decreases() {
        let mut previous = 0.0;
        for count in 1..2_000 {
            let c = confidence(count);
            assert!(c >= previous, "dropped at count {}", count);
            previous = c;
        }
    }

    #[test]
    fn test_record_incident_counts_up() {
        let sender = address!("00000000000000000000000000000000000000aa");
        let mut tracker = SpamScoreTracker::default();

        let first = tracker.record_incident(sender);
        let second = tracker.record_incident(sender);

        assert_eq!(tracker.count(&sender), 2);
        assert!(second > first);
        assert_eq!(tracker.count(&Address::ZERO), 0);
    }

    #[test]
    fn test_top_orders_by_count() {
        let a = address!("00000000000000000000000000000000000000aa");
        let b = address!("00000000000000000000000000000000000000bb");
        let mut table = SpamScoreTable::new();
        table.increment(a);
        table.increment(b);
        table.increment(b);

        assert_eq!(table.top(1), vec![(b, 2)]);
        assert_eq!(table.top(10).len(), 2);
    }
}
