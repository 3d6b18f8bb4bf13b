use alloy_primitives::Address;
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::{DetectorError, Result};

/// Known scam-token contracts
///
/// Addresses are stored parsed, so `0xAbC...` and `0xabc...` are one entry.
/// There is deliberately no removal: once a token is known it stays known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScamTokenRegistry {
    tokens: BTreeSet<Address>,
}

impl ScamTokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_set(tokens: BTreeSet<Address>) -> Self {
        Self { tokens }
    }

    pub fn contains(&self, token: &Address) -> bool {
        self.tokens.contains(token)
    }

    /// Returns `true` if the token was not known yet
    pub fn insert(&mut self, token: Address) -> bool {
        self.tokens.insert(token)
    }

    /// Parse and insert a textual address
    pub fn insert_str(&mut self, token: &str) -> Result<bool> {
        let address = Address::from_str(token.trim())
            .map_err(|_| DetectorError::InvalidAddress(token.to_string()))?;
        Ok(self.insert(address))
    }

    /// Union-merge, returns how many tokens were new
    pub fn merge<I>(&mut self, tokens: I) -> usize
    where
        I: IntoIterator<Item = Address>,
    {
        tokens.into_iter().filter(|t| self.tokens.insert(*t)).count()
    }

    pub fn snapshot(&self) -> BTreeSet<Address> {
        self.tokens.clone()
    }

    pub fn into_set(self) -> BTreeSet<Address> {
        self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.tokens.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn sample(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    #[test]
    fn test_merge_is_idempotent() {
        let batch: Vec<Address> = (1..=5).map(sample).collect();

        let mut once = ScamTokenRegistry::new();
        assert_eq!(once.merge(batch.clone()), 5);

        let mut twice = ScamTokenRegistry::new();
        twice.merge(batch.clone());
        assert_eq!(twice.merge(batch), 0);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_membership_never_drops() {
        let mut registry = ScamTokenRegistry::new();
        let mut seen = Vec::new();

        for round in 0..10u8 {
            let batch: Vec<Address> = (0..round).map(|i| sample(i.wrapping_mul(7))).collect();
            registry.merge(batch.clone());
            seen.extend(batch);
            assert!(seen.iter().all(|t| registry.contains(t)), "lost a token in round {}", round);
        }
    }

    #[test]
    fn test_case_variants_are_one_token() {
        let mut registry = ScamTokenRegistry::new();
        assert!(registry.insert_str("0x3845badade8e6dff049820680d1f14bd3903a5d0").unwrap());
        assert!(!registry.insert_str("0x3845badAde8e6dFF049820680d1F14bD3903a5d0").unwrap());

        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&address!("3845badade8e6dff049820680d1f14bd3903a5d0")));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let mut registry = ScamTokenRegistry::new();
        assert!(matches!(
            registry.insert_str("not-an-address"),
            Err(DetectorError::InvalidAddress(_))
        ));
        assert!(registry.is_empty());
    }
}
