//! Reference assets and supported chains
//!
//! A scam-token transfer only matters when the receiver holds the real asset
//! the scam token imitates. The Sandbox assets exist on Ethereum mainnet and
//! on Polygon, so those are the two chains the detector runs on.

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

// ============================================
// CHAINS
// ============================================

/// Chains the detector runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Chain {
    /// Ethereum mainnet (chain id 1)
    Mainnet,

    /// Polygon PoS (chain id 137)
    Polygon,
}

impl Chain {
    pub const ALL: [Chain; 2] = [Chain::Mainnet, Chain::Polygon];

    /// Map a numeric chain id; anything else is unsupported
    pub fn from_id(id: u64) -> Option<Self> {
        match id {
            1 => Some(Chain::Mainnet),
            137 => Some(Chain::Polygon),
            _ => None,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Chain::Mainnet => 1,
            Chain::Polygon => 137,
        }
    }

    /// Protocol tag carried on findings
    pub fn protocol(&self) -> &'static str {
        match self {
            Chain::Mainnet => "mainnet",
            Chain::Polygon => "matic",
        }
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Chain::Mainnet => write!(f, "Ethereum (1)"),
            Chain::Polygon => write!(f, "Polygon (137)"),
        }
    }
}

// ============================================
// REFERENCE ASSETS
// ============================================

/// A contract on a specific chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContractRef {
    pub chain: Chain,
    pub address: Address,
}

/// The legitimate asset whose holders we protect
#[derive(Debug, Clone)]
pub struct ReferenceAsset {
    pub symbol: &'static str,

    /// Protocol name put on SPAMMER labels
    pub protocol_name: &'static str,

    /// One deployment per supported chain
    pub deployments: Vec<ContractRef>,
}

impl ReferenceAsset {
    pub fn deployment_on(&self, chain: Chain) -> Option<&ContractRef> {
        self.deployments.iter().find(|d| d.chain == chain)
    }
}

/// SAND (ERC-20)
pub fn sand() -> ReferenceAsset {
    ReferenceAsset {
        symbol: "SAND",
        protocol_name: "Sandbox",
        deployments: vec![
            ContractRef {
                chain: Chain::Mainnet,
                address: address!("3845badade8e6dff049820680d1f14bd3903a5d0"),
            },
            ContractRef {
                chain: Chain::Polygon,
                address: address!("bbba073c31bf03b8acf7c28ef0738decf3695683"),
            },
        ],
    }
}

/// LAND (ERC-721, `balanceOf` counts parcels)
pub fn land() -> ReferenceAsset {
    ReferenceAsset {
        symbol: "LAND",
        protocol_name: "Sandbox",
        deployments: vec![
            ContractRef {
                chain: Chain::Mainnet,
                address: address!("5cc5b05a8a13e3fbdb0bb9fccd98d38e50f90c38"),
            },
            ContractRef {
                chain: Chain::Polygon,
                address: address!("9d305a42a3975ee4c1c57555bed5919889dce63f"),
            },
        ],
    }
}

/// Look up a reference asset by symbol (case-insensitive)
pub fn reference_asset(symbol: &str) -> Option<ReferenceAsset> {
    match symbol.to_uppercase().as_str() {
        "SAND" => Some(sand()),
        "LAND" => Some(land()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_ids() {
        assert_eq!(Chain::from_id(1), Some(Chain::Mainnet));
        assert_eq!(Chain::from_id(137), Some(Chain::Polygon));
        assert_eq!(Chain::from_id(56), None);
        assert_eq!(Chain::Polygon.protocol(), "matic");
    }

    #[test]
    fn test_sand_has_both_chains() {
        let asset = sand();
        for chain in Chain::ALL {
            assert!(asset.deployment_on(chain).is_some(), "missing {}", chain);
        }
        assert!(reference_asset("land").is_some());
        assert!(reference_asset("MANA").is_none());
    }
}
