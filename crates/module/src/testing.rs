//! Test harness: a minimal simulated host ledger driving the engine
//! block by block.

use fundraising_types::{Address, Coin};

use crate::host::{Bank, BlockContext, CallContext};
use crate::keeper::Keeper;
use crate::memory::{MemBank, MemEvents, MemKv};

/// A deterministic test address.
pub fn addr(tag: u8) -> Address {
    [tag; 32]
}

/// An in-memory application wrapping the keeper, tracking block height and
/// time, and running the end-of-block sweep on every advance.
pub struct TestApp {
    pub keeper: Keeper<MemKv, MemBank, MemEvents>,
    pub height: u64,
    pub time: u64,
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            keeper: Keeper::new(MemKv::new(), MemBank::new(), MemEvents::new()),
            height: 1,
            time: 0,
        }
    }

    pub fn fund(&mut self, addr: Address, coin: Coin) {
        self.keeper.bank_mut().mint(&addr, &coin);
    }

    pub fn balance(&self, addr: Address, denom: &str) -> u128 {
        self.keeper.bank().spendable(&addr, denom)
    }

    pub fn ctx(&self, sender: Address) -> CallContext {
        CallContext {
            sender,
            height: self.height,
            block_time: self.time,
        }
    }

    pub fn block_ctx(&self) -> BlockContext {
        BlockContext {
            height: self.height,
            block_time: self.time,
        }
    }

    /// Commits a block at `block_time`, running the end-of-block sweep.
    pub fn advance_to(&mut self, block_time: u64) {
        self.height += 1;
        self.time = block_time;
        let ctx = self.block_ctx();
        self.keeper.end_block(&ctx);
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
