//! Interfaces supplied by the host ledger.
//!
//! The engine is embedded in a replicated ledger that provides block time,
//! coin transfers, durable key-value storage, and an event stream. All four
//! are consumed through the traits below; the ledger commits or rolls back a
//! block in whole, so none of these operations need their own transaction
//! scope.

use thiserror::Error;

use fundraising_types::{Address, Coin};

use crate::event::Event;

/// Context supplied by the host for each call.
#[derive(Clone, Debug)]
pub struct CallContext {
    /// Authenticated sender of the message.
    pub sender: Address,
    /// Current block height.
    pub height: u64,
    /// Current block timestamp, seconds.
    pub block_time: u64,
}

/// Context supplied by the host for the end-of-block sweep.
#[derive(Clone, Copy, Debug)]
pub struct BlockContext {
    pub height: u64,
    pub block_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    #[error("insufficient spendable balance of {denom}: have {have}, need {need}")]
    InsufficientFunds {
        denom: String,
        have: u128,
        need: u128,
    },

    #[error("batch transfer inputs and outputs do not balance")]
    UnbalancedBatch,
}

/// Coin-transfer service over account-denominated balances.
pub trait Bank {
    /// Spendable balance of `denom` held by `addr`.
    fn spendable(&self, addr: &Address, denom: &str) -> u128;

    /// Transfers `coins` from one account to another. Atomic: on error no
    /// balance has changed.
    fn send(&mut self, from: &Address, to: &Address, coins: &[Coin]) -> Result<(), BankError>;

    /// Atomic multi-party transfer; per denom, the inputs must equal the
    /// outputs. Either all outputs land or none do.
    fn batch_send(
        &mut self,
        inputs: &[(Address, Coin)],
        outputs: &[(Address, Coin)],
    ) -> Result<(), BankError>;
}

/// Byte-keyed durable storage, block-atomic.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn set(&mut self, key: &[u8], value: Vec<u8>);

    fn delete(&mut self, key: &[u8]);

    /// All entries whose key starts with `prefix`, in ascending key order.
    /// Key ordering is consensus-critical: sequences and release times are
    /// encoded big-endian so that this iteration yields them in order.
    fn iter_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)>;
}

/// Append-only stream of domain events, transactional with the store.
pub trait EventSink {
    fn emit(&mut self, event: Event);
}
