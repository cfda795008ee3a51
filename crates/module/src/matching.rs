//! Clearing engine: allocation and refund computation for both auction
//! kinds.
//!
//! Fixed-price clearing walks bids in sequence order at the fixed start
//! price. Batch clearing finds the highest uniform price at which the
//! cap-clamped demand fits the inventory, then fills bids in ascending
//! sequence order. All selling quantities are floored to whole units;
//! payments are ceiled, which keeps every refund non-negative.

use std::collections::BTreeMap;

use fundraising_types::{Address, Auction, Bid, BidType, Dec};

use crate::host::{Bank, EventSink, KvStore};
use crate::keeper::Keeper;

/// Result of one clearing pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchingInfo {
    /// The price the auction settles at; the start price for fixed-price
    /// auctions, `P*` for batch auctions, zero when nothing matched.
    pub matched_price: Dec,
    /// Number of bids with a non-zero matched contribution.
    pub matched_len: u64,
    /// Total selling-coin amount allocated.
    pub total_matched_amount: u128,
    pub allocation_map: BTreeMap<Address, u128>,
    pub refund_map: BTreeMap<Address, u128>,
}

/// Selling units a batch bid demands when the auction clears at `price`.
fn batch_bid_units(bid: &Bid, price: &Dec) -> u128 {
    match bid.bid_type {
        BidType::BatchMany => bid.coin.amount,
        // quotient overflow can only be cut down by the bidder cap, so
        // saturate and let the clamp bound it
        BidType::BatchWorth => Dec::div_floor(bid.coin.amount, price).unwrap_or(u128::MAX),
        BidType::FixedPrice => panic!("fixed price bid in batch clearing"),
    }
}

fn add_assign(map: &mut BTreeMap<Address, u128>, key: Address, amount: u128) {
    let entry = map.entry(key).or_insert(0);
    *entry = entry
        .checked_add(amount)
        .unwrap_or_else(|| panic!("amount overflow while clearing"));
}

fn paying_amount(bid: &Bid, paying_coin_denom: &str) -> u128 {
    bid.to_paying_amount(paying_coin_denom)
        .unwrap_or_else(|| panic!("paying amount overflow for bid {}", bid.sequence))
}

impl<K: KvStore, B: Bank, E: EventSink> Keeper<K, B, E> {
    /// Fixed-price allocation: bids fill in sequence order at the start
    /// price, clamped by the bidder's cap and the remaining inventory.
    /// Refunds cover whatever part of a bid's escrow went unfilled.
    pub fn calculate_fixed_price_allocation(&mut self, auction: &Auction) -> MatchingInfo {
        let base = auction.base();
        let price = base.start_price.clone();
        let allowed = base.allowed_bidders_map();

        let mut remaining = base.remaining_selling_coin.amount;
        let mut allocation_map: BTreeMap<Address, u128> = BTreeMap::new();
        let mut escrowed: BTreeMap<Address, u128> = BTreeMap::new();
        let mut paid: BTreeMap<Address, u128> = BTreeMap::new();
        let mut matched_len = 0u64;

        for mut bid in self.get_bids_by_auction(base.id) {
            add_assign(
                &mut escrowed,
                bid.bidder,
                paying_amount(&bid, &base.paying_coin_denom),
            );

            let Some(cap) = allowed.get(&bid.bidder).copied() else {
                continue;
            };
            if bid.is_matched {
                continue;
            }

            let demand = bid
                .to_selling_amount(&base.paying_coin_denom)
                .unwrap_or(u128::MAX);
            let already = allocation_map.get(&bid.bidder).copied().unwrap_or(0);
            let fill = demand.min(cap.saturating_sub(already)).min(remaining);
            if fill == 0 {
                continue;
            }

            add_assign(&mut allocation_map, bid.bidder, fill);
            remaining -= fill;
            add_assign(
                &mut paid,
                bid.bidder,
                price
                    .mul_ceil(fill)
                    .unwrap_or_else(|| panic!("paying amount overflow while clearing")),
            );
            bid.is_matched = true;
            self.set_bid(&bid);
            matched_len += 1;
        }

        let refund_map = refunds(&escrowed, &paid);
        let total_matched_amount = allocation_map.values().sum();

        MatchingInfo {
            matched_price: price,
            matched_len,
            total_matched_amount,
            allocation_map,
            refund_map,
        }
    }

    /// Batch uniform-price clearing.
    ///
    /// `P*` is the highest candidate bid price at which the sum of every
    /// bidder's cap-clamped demand fits the inventory. Matched flags, the
    /// matched price, and the matched-bid count are persisted so the
    /// extended-round controller can compare consecutive passes.
    pub fn calculate_batch_allocation(&mut self, auction: &mut Auction) -> MatchingInfo {
        let base = auction.base().clone();
        let extras = auction
            .batch_extras()
            .unwrap_or_else(|| panic!("batch clearing on a fixed price auction"))
            .clone();

        let bids = self.get_bids_by_auction(base.id);
        let allowed = base.allowed_bidders_map();
        let inventory = base.selling_coin.amount;

        let mut candidates: Vec<Dec> = bids
            .iter()
            .map(|bid| bid.price.clone())
            .filter(|price| *price >= extras.min_bid_price)
            .collect();
        candidates.sort();
        candidates.dedup();
        candidates.reverse();

        // highest candidate whose clamped demand fits the inventory; ties on
        // demand resolve to the higher price by scan order
        let mut cleared: Option<(Dec, BTreeMap<Address, u128>)> = None;
        for price in candidates {
            let demand = clamped_demand(&bids, &allowed, &price);
            let mut total: u128 = 0;
            let mut fits = true;
            for amount in demand.values() {
                match total.checked_add(*amount) {
                    Some(sum) => total = sum,
                    None => {
                        fits = false;
                        break;
                    }
                }
            }
            if fits && total <= inventory {
                cleared = Some((price, demand));
                break;
            }
        }

        let mut escrowed: BTreeMap<Address, u128> = BTreeMap::new();
        let mut matched_len = 0u64;

        let (matched_price, allocation_map) = match cleared {
            None => {
                for mut bid in bids {
                    add_assign(
                        &mut escrowed,
                        bid.bidder,
                        paying_amount(&bid, &base.paying_coin_denom),
                    );
                    bid.is_matched = false;
                    self.set_bid(&bid);
                }
                (Dec::zero(), BTreeMap::new())
            }
            Some((price, demand)) => {
                // fill bids in ascending sequence order until the bidder's
                // clamped demand is reached; overflow bids stay unmatched
                let mut fill_left = demand.clone();
                for mut bid in bids {
                    add_assign(
                        &mut escrowed,
                        bid.bidder,
                        paying_amount(&bid, &base.paying_coin_denom),
                    );

                    let mut contribution = 0u128;
                    if bid.price >= price && allowed.contains_key(&bid.bidder) {
                        let left = fill_left.entry(bid.bidder).or_insert(0);
                        contribution = batch_bid_units(&bid, &price).min(*left);
                        *left -= contribution;
                    }
                    bid.is_matched = contribution > 0;
                    if bid.is_matched {
                        matched_len += 1;
                    }
                    self.set_bid(&bid);
                }
                (price, demand)
            }
        };

        let mut paid: BTreeMap<Address, u128> = BTreeMap::new();
        for (bidder, allocated) in &allocation_map {
            if *allocated == 0 {
                continue;
            }
            paid.insert(
                *bidder,
                matched_price
                    .mul_ceil(*allocated)
                    .unwrap_or_else(|| panic!("paying amount overflow while clearing")),
            );
        }
        let refund_map = refunds(&escrowed, &paid);
        let total_matched_amount = allocation_map.values().sum();

        if let Some(extras) = auction.batch_extras_mut() {
            extras.matched_price = matched_price.clone();
        }
        self.set_auction(auction);
        self.set_matched_bids_len(base.id, matched_len);

        MatchingInfo {
            matched_price,
            matched_len,
            total_matched_amount,
            allocation_map,
            refund_map,
        }
    }
}

/// Per-bidder demand at `price` across bids priced at or above it, clamped
/// to the bidder's maximum bid amount.
fn clamped_demand(
    bids: &[Bid],
    allowed: &BTreeMap<Address, u128>,
    price: &Dec,
) -> BTreeMap<Address, u128> {
    let mut demand: BTreeMap<Address, u128> = BTreeMap::new();
    for bid in bids {
        if bid.price < *price {
            continue;
        }
        if !allowed.contains_key(&bid.bidder) {
            continue;
        }
        let units = batch_bid_units(bid, price);
        let entry = demand.entry(bid.bidder).or_insert(0);
        *entry = entry.saturating_add(units);
    }
    for (bidder, amount) in demand.iter_mut() {
        *amount = (*amount).min(allowed[bidder]);
    }
    demand
}

fn refunds(
    escrowed: &BTreeMap<Address, u128>,
    paid: &BTreeMap<Address, u128>,
) -> BTreeMap<Address, u128> {
    escrowed
        .iter()
        .map(|(bidder, escrow)| {
            let pay = paid.get(bidder).copied().unwrap_or(0);
            let refund = escrow.checked_sub(pay).unwrap_or_else(|| {
                panic!("bidder payment exceeds escrowed amount")
            });
            (*bidder, refund)
        })
        .collect()
}
