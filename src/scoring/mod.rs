//! Spammer scoring and finding emission

mod finding;
mod tracker;

pub use finding::{
    EntityType, Finding, FindingType, Label, Severity, SPAMMER_LABEL, USER_SPAMMED_ALERT_ID,
};
pub use tracker::{confidence, SpamScoreTable, SpamScoreTracker};
