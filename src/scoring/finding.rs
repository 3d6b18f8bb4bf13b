use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::assets::{Chain, ReferenceAsset};
use crate::scanner::TransferEvent;

pub const USER_SPAMMED_ALERT_ID: &str = "USER-SPAMMED";
pub const SPAMMER_LABEL: &str = "SPAMMER";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingType {
    Info,
    Suspicious,
    Scam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    Address,
    Transaction,
}

/// Entity label attached to a finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub entity_type: EntityType,
    pub entity: Address,
    pub label: String,
    pub confidence: f64,
    pub remove: bool,
    pub metadata: BTreeMap<String, String>,
}

/// One scam token landing on one real holder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub sender_address: Address,
    pub scam_token_address: Address,
    pub receiver_address: Address,
    pub confidence: f64,
    pub chain: Chain,

    pub name: String,
    pub description: String,
    pub alert_id: String,
    pub severity: Severity,
    #[serde(rename = "type")]
    pub finding_type: FindingType,
    pub protocol: String,
    pub addresses: Vec<Address>,
    pub metadata: BTreeMap<String, String>,
    pub labels: Vec<Label>,
}

impl Finding {
    pub fn spammed_holder(
        transfer: &TransferEvent,
        chain: Chain,
        confidence: f64,
        asset: &ReferenceAsset,
    ) -> Self {
        let metadata = BTreeMap::from([
            ("receiver".to_string(), transfer.receiver.to_string()),
            ("scamToken".to_string(), transfer.token.to_string()),
            ("sender".to_string(), transfer.sender.to_string()),
        ]);

        let label = Label {
            entity_type: EntityType::Address,
            entity: transfer.sender,
            label: SPAMMER_LABEL.to_string(),
            confidence,
            remove: false,
            metadata: BTreeMap::from([(
                "spammingToProtocol".to_string(),
                asset.protocol_name.to_string(),
            )]),
        };

        Self {
            sender_address: transfer.sender,
            scam_token_address: transfer.token,
            receiver_address: transfer.receiver,
            confidence,
            chain,
            name: format!("{} holder received scam token", asset.symbol),
            description: format!(
                "A {} scam token {} was sent to account holding real {} {} from {}",
                asset.symbol, transfer.token, asset.symbol, transfer.receiver, transfer.sender
            ),
            alert_id: USER_SPAMMED_ALERT_ID.to_string(),
            severity: Severity::Low,
            finding_type: FindingType::Scam,
            protocol: chain.protocol().to_string(),
            addresses: vec![transfer.receiver],
            metadata,
            labels: vec![label],
        }
    }
}
