//! In-memory implementations of the host interfaces.
//!
//! Used by the unit and integration tests and by the mock chain; a real
//! deployment wires the engine to the ledger's own bank and store instead.

use std::collections::BTreeMap;

use fundraising_types::{Address, Coin};

use crate::event::Event;
use crate::host::{Bank, BankError, EventSink, KvStore};

/// Account-denominated balances held in maps.
#[derive(Debug, Default)]
pub struct MemBank {
    balances: BTreeMap<Address, BTreeMap<String, u128>>,
}

impl MemBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits an account out of thin air.
    pub fn mint(&mut self, addr: &Address, coin: &Coin) {
        let balance = self
            .balances
            .entry(*addr)
            .or_default()
            .entry(coin.denom.clone())
            .or_insert(0);
        *balance += coin.amount;
    }

    fn balance(&self, addr: &Address, denom: &str) -> u128 {
        self.balances
            .get(addr)
            .and_then(|coins| coins.get(denom))
            .copied()
            .unwrap_or(0)
    }

    fn check(&self, transfers: &[(Address, Coin)]) -> Result<(), BankError> {
        let mut needed: BTreeMap<(Address, &str), u128> = BTreeMap::new();
        for (from, coin) in transfers {
            *needed.entry((*from, coin.denom.as_str())).or_insert(0) += coin.amount;
        }
        for ((from, denom), need) in needed {
            let have = self.balance(&from, denom);
            if have < need {
                return Err(BankError::InsufficientFunds {
                    denom: denom.to_string(),
                    have,
                    need,
                });
            }
        }
        Ok(())
    }

    fn apply(&mut self, from: &Address, to: &Address, coin: &Coin) {
        let source = self
            .balances
            .entry(*from)
            .or_default()
            .entry(coin.denom.clone())
            .or_insert(0);
        *source -= coin.amount;
        let target = self
            .balances
            .entry(*to)
            .or_default()
            .entry(coin.denom.clone())
            .or_insert(0);
        *target += coin.amount;
    }
}

impl Bank for MemBank {
    fn spendable(&self, addr: &Address, denom: &str) -> u128 {
        self.balance(addr, denom)
    }

    fn send(&mut self, from: &Address, to: &Address, coins: &[Coin]) -> Result<(), BankError> {
        let transfers: Vec<(Address, Coin)> =
            coins.iter().map(|coin| (*from, coin.clone())).collect();
        self.check(&transfers)?;
        for coin in coins {
            self.apply(from, to, coin);
        }
        Ok(())
    }

    fn batch_send(
        &mut self,
        inputs: &[(Address, Coin)],
        outputs: &[(Address, Coin)],
    ) -> Result<(), BankError> {
        let mut input_totals: BTreeMap<&str, u128> = BTreeMap::new();
        for (_, coin) in inputs {
            *input_totals.entry(coin.denom.as_str()).or_insert(0) += coin.amount;
        }
        let mut output_totals: BTreeMap<&str, u128> = BTreeMap::new();
        for (_, coin) in outputs {
            *output_totals.entry(coin.denom.as_str()).or_insert(0) += coin.amount;
        }
        if input_totals != output_totals {
            return Err(BankError::UnbalancedBatch);
        }

        self.check(inputs)?;
        for (from, coin) in inputs {
            let source = self
                .balances
                .entry(*from)
                .or_default()
                .entry(coin.denom.clone())
                .or_insert(0);
            *source -= coin.amount;
        }
        for (to, coin) in outputs {
            let target = self
                .balances
                .entry(*to)
                .or_default()
                .entry(coin.denom.clone())
                .or_insert(0);
            *target += coin.amount;
        }
        Ok(())
    }
}

/// Ordered byte-keyed storage.
#[derive(Debug, Default)]
pub struct MemKv {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full committed state, for determinism checks.
    pub fn dump(&self) -> &BTreeMap<Vec<u8>, Vec<u8>> {
        &self.entries
    }
}

impl KvStore for MemKv {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.entries.insert(key.to_vec(), value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.entries.remove(key);
    }

    fn iter_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.entries
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Collects emitted events in order.
#[derive(Debug, Default)]
pub struct MemEvents {
    events: Vec<Event>,
}

impl MemEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> &[Event] {
        &self.events
    }

    pub fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for MemEvents {
    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}
