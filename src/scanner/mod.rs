//! Log Scanner
//!
//! Picks the transfer logs emitted by known scam tokens out of a transaction
//! and turns them into (token, sender, receiver) triples.

mod events;

pub use events::{decode_transfer, is_transfer_signature, LogEntry, TransferEvent};

use tracing::debug;

use crate::intel::ScamTokenRegistry;

#[cfg(test)]
pub(crate) use events::tests as events_fixtures;

/// Transfers of registered scam tokens, in log order
pub fn scan_logs(logs: &[LogEntry], registry: &ScamTokenRegistry) -> Vec<TransferEvent> {
    let transfers: Vec<TransferEvent> = logs
        .iter()
        .filter(|log| registry.contains(&log.address))
        .filter(|log| log.topics.first().map(is_transfer_signature).unwrap_or(false))
        .filter_map(decode_transfer)
        .collect();

    debug!(
        "Scanned {} logs, {} scam-token transfers",
        logs.len(),
        transfers.len()
    );
    transfers
}

#[cfg(test)]
mod tests {
    use super::events::tests::erc20_transfer_log;
    use super::*;
    use alloy_primitives::{address, Bytes};

    #[test]
    fn test_only_registered_tokens_match() {
        let scam = address!("00000000000000000000000000000000000000c1");
        let legit = address!("00000000000000000000000000000000000000c2");
        let from = address!("00000000000000000000000000000000000000a1");
        let to = address!("00000000000000000000000000000000000000b1");

        let mut registry = ScamTokenRegistry::new();
        registry.insert(scam);

        let logs = vec![
            erc20_transfer_log(legit, from, to, Bytes::new()),
            erc20_transfer_log(scam, from, to, Bytes::new()),
        ];

        let transfers = scan_logs(&logs, &registry);
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].token, scam);
        assert_eq!(transfers[0].receiver, to);
    }

    #[test]
    fn test_empty_registry_matches_nothing() {
        let token = address!("00000000000000000000000000000000000000c1");
        let logs = vec![erc20_transfer_log(token, token, token, Bytes::new())];
        assert!(scan_logs(&logs, &ScamTokenRegistry::new()).is_empty());
    }
}
