//! Spam Radar
//!
//! Watches transactions for transfers of known scam tokens and flags the
//! senders that target real holders of a reference asset.
//!
//! Modules:
//! - `intel`: scam-token registry, alert-feed seeding and peer alerts
//! - `scanner`: transfer log decoding
//! - `verifier`: Multicall3 holder checks across chains
//! - `scoring`: per-spammer counters, confidence and findings
//! - `state`: persistence between invocations
//! - `detector`: the pipeline tying them together

pub mod assets;
pub mod blocks;
pub mod config;
pub mod detector;
pub mod error;
pub mod intel;
pub mod scanner;
pub mod scoring;
pub mod state;
pub mod verifier;

pub use assets::{Chain, ContractRef, ReferenceAsset};
pub use config::Config;
pub use detector::{AlertSubscription, Detector, InitReport, TransactionEvent};
pub use error::{DetectorError, Result};
pub use scoring::Finding;
