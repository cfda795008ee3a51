//! Bid records and amount conversions.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{Address, Coin, Dec};

/// How a bid expresses its demand.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum BidType {
    /// Fixed-price auction bid; the coin may be stated in either denom.
    FixedPrice,
    /// Batch bid committing a paying-coin amount, accepting up to
    /// `coin / price` selling units.
    BatchWorth,
    /// Batch bid demanding an exact quantity of selling units at the stated
    /// price.
    BatchMany,
}

/// A bid placed on an auction. `sequence` is per-auction monotonic.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Bid {
    pub auction_id: u64,
    pub sequence: u64,
    pub bidder: Address,
    pub price: Dec,
    pub coin: Coin,
    pub bid_type: BidType,
    pub is_matched: bool,
}

impl Bid {
    /// Demand in selling-coin units: the stated quantity for selling-denom
    /// bids, `⌊coin / price⌋` for paying-denom bids.
    pub fn to_selling_amount(&self, paying_coin_denom: &str) -> Option<u128> {
        if self.coin.denom == paying_coin_denom {
            Dec::div_floor(self.coin.amount, &self.price)
        } else {
            Some(self.coin.amount)
        }
    }

    /// The paying-coin amount escrowed for this bid: the stated amount for
    /// paying-denom bids, `⌈quantity × price⌉` for selling-denom bids.
    pub fn to_paying_amount(&self, paying_coin_denom: &str) -> Option<u128> {
        if self.coin.denom == paying_coin_denom {
            Some(self.coin.amount)
        } else {
            self.price.mul_ceil(self.coin.amount)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bid(price: &str, coin: Coin, bid_type: BidType) -> Bid {
        Bid {
            auction_id: 1,
            sequence: 1,
            bidder: [9u8; 32],
            price: price.parse().unwrap(),
            coin,
            bid_type,
            is_matched: false,
        }
    }

    #[test]
    fn test_paying_denom_bid_conversions() {
        let b = bid("2.0", Coin::new("denom2", 1001), BidType::BatchWorth);
        assert_eq!(b.to_selling_amount("denom2"), Some(500));
        assert_eq!(b.to_paying_amount("denom2"), Some(1001));
    }

    #[test]
    fn test_selling_denom_bid_conversions() {
        let b = bid("1.5", Coin::new("denom1", 333), BidType::BatchMany);
        assert_eq!(b.to_selling_amount("denom2"), Some(333));
        assert_eq!(b.to_paying_amount("denom2"), Some(500));
    }
}
