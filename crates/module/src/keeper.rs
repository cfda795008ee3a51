//! The engine keeper: host handles plus the reserve ledger.

use std::collections::BTreeMap;

use fundraising_types::{fee_collector_address, Address, Auction, Coin};

use crate::error::FundraisingError;
use crate::host::{Bank, BankError, EventSink, KvStore};
use crate::matching::MatchingInfo;

/// Owns the host service handles and mediates every state mutation of the
/// engine.
pub struct Keeper<K, B, E> {
    kv: K,
    bank: B,
    events: E,
}

impl<K: KvStore, B: Bank, E: EventSink> Keeper<K, B, E> {
    pub fn new(kv: K, bank: B, events: E) -> Self {
        Self { kv, bank, events }
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    pub(crate) fn kv_mut(&mut self) -> &mut K {
        &mut self.kv
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut E {
        &mut self.events
    }

    /// Checks that `addr` can spend every coin of `coins`, accumulating
    /// amounts per denom. Handlers call this before any transfer so that a
    /// rejected message leaves no state change behind.
    pub(crate) fn ensure_spendable(
        &self,
        addr: &Address,
        coins: &[Coin],
    ) -> Result<(), FundraisingError> {
        let mut needed: BTreeMap<&str, u128> = BTreeMap::new();
        for coin in coins {
            let need = needed.entry(coin.denom.as_str()).or_insert(0);
            *need = need.checked_add(coin.amount).ok_or_else(|| {
                FundraisingError::InvalidRequest("coin amount overflow".into())
            })?;
        }
        for (denom, need) in needed {
            let have = self.bank.spendable(addr, denom);
            if have < need {
                return Err(BankError::InsufficientFunds {
                    denom: denom.to_string(),
                    have,
                    need,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Reserves the auction creation fee from the auctioneer into the module
    /// fee collector.
    pub(crate) fn reserve_creation_fee(
        &mut self,
        auctioneer: &Address,
    ) -> Result<(), FundraisingError> {
        let fee = self.get_params().auction_creation_fee;
        if fee.is_empty() {
            return Ok(());
        }
        self.bank
            .send(auctioneer, &fee_collector_address(), &fee)
            .map_err(Into::into)
    }

    /// Escrows the selling coin from the auctioneer into the selling reserve.
    pub(crate) fn reserve_selling_coin(
        &mut self,
        selling_reserve: &Address,
        auctioneer: &Address,
        selling_coin: &Coin,
    ) -> Result<(), FundraisingError> {
        self.bank
            .send(auctioneer, selling_reserve, &[selling_coin.clone()])
            .map_err(Into::into)
    }

    /// Escrows a bid's paying coin from the bidder into the paying reserve.
    pub(crate) fn reserve_paying_coin(
        &mut self,
        paying_reserve: &Address,
        bidder: &Address,
        paying_coin: &Coin,
    ) -> Result<(), FundraisingError> {
        self.bank
            .send(bidder, paying_reserve, &[paying_coin.clone()])
            .map_err(Into::into)
    }

    /// Sends the entire selling-denom balance of the selling reserve back to
    /// the auctioneer.
    pub(crate) fn release_selling_remaining(
        &mut self,
        auction: &Auction,
    ) -> Result<(), BankError> {
        let base = auction.base();
        let denom = &base.selling_coin.denom;
        let release_amount = self
            .bank
            .spendable(&base.selling_reserve_address, denom);
        if release_amount == 0 {
            return Ok(());
        }
        self.bank.send(
            &base.selling_reserve_address,
            &base.auctioneer,
            &[Coin::new(denom.clone(), release_amount)],
        )
    }

    /// Pays out the allocation map from the selling reserve in one atomic
    /// batched transfer. Zero-amount entries are omitted.
    pub(crate) fn allocate_selling_coin(
        &mut self,
        auction: &Auction,
        matching_info: &MatchingInfo,
    ) -> Result<(), BankError> {
        let base = auction.base();
        let denom = &base.selling_coin.denom;

        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        for (bidder, allocated) in &matching_info.allocation_map {
            if *allocated == 0 {
                continue;
            }
            let coin = Coin::new(denom.clone(), *allocated);
            inputs.push((base.selling_reserve_address, coin.clone()));
            outputs.push((*bidder, coin));
        }
        self.bank.batch_send(&inputs, &outputs)
    }

    /// Refunds unmatched paying coins from the paying reserve in one atomic
    /// batched transfer. Zero-amount entries are omitted.
    pub(crate) fn refund_paying_coin(
        &mut self,
        auction: &Auction,
        matching_info: &MatchingInfo,
    ) -> Result<(), BankError> {
        let base = auction.base();
        let denom = &base.paying_coin_denom;

        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        for (bidder, refund) in &matching_info.refund_map {
            if *refund == 0 {
                continue;
            }
            let coin = Coin::new(denom.clone(), *refund);
            inputs.push((base.paying_reserve_address, coin.clone()));
            outputs.push((*bidder, coin));
        }
        self.bank.batch_send(&inputs, &outputs)
    }
}
