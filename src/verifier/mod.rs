//! Holder verification over Multicall3
//!
//! Balance checks for many receivers, batched per chain. A reverting or
//! timed-out call marks only the affected addresses as unresolved.

mod holder;
mod multicall;

pub use holder::{HolderClassification, HolderVerifier};
pub use multicall::{
    balance_of_call, BatchCaller, IBalanceOf, IMulticall3, Multicall3Client, MAX_CALLS_PER_BATCH,
    MULTICALL3,
};

#[cfg(test)]
pub(crate) use holder::tests as holder_fixtures;
#[cfg(test)]
pub(crate) use multicall::tests as multicall_fixtures;
