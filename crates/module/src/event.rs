//! Domain events emitted on lifecycle transitions.

use fundraising_types::Address;

/// A typed event record with string attributes. Consumers are purely
/// observational; nothing in the engine reads these back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub ty: String,
    pub attributes: Vec<(String, String)>,
}

impl Event {
    pub fn new(ty: &str) -> Self {
        Self {
            ty: ty.to_string(),
            attributes: Vec::new(),
        }
    }

    pub fn attr(mut self, key: &str, value: impl ToString) -> Self {
        self.attributes.push((key.to_string(), value.to_string()));
        self
    }
}

pub fn addr_hex(addr: &Address) -> String {
    hex::encode(addr)
}

/// Event type names.
pub mod types {
    pub const CREATE_FIXED_PRICE_AUCTION: &str = "create_fixed_price_auction";
    pub const CREATE_BATCH_AUCTION: &str = "create_batch_auction";
    pub const CANCEL_AUCTION: &str = "cancel_auction";
    pub const AUCTION_STARTED: &str = "auction_started";
    pub const PLACE_BID: &str = "place_bid";
    pub const MODIFY_BID: &str = "modify_bid";
    pub const EXTENDED_ROUND: &str = "extended_round";
    pub const AUCTION_FINALIZED: &str = "auction_finalized";
    pub const VESTING_RELEASED: &str = "vesting_released";
    pub const AUCTION_FINISHED: &str = "auction_finished";
}

/// Attribute keys.
pub mod keys {
    pub const AUCTION_ID: &str = "auction_id";
    pub const AUCTIONEER: &str = "auctioneer_address";
    pub const SELLING_RESERVE: &str = "selling_reserve_address";
    pub const PAYING_RESERVE: &str = "paying_reserve_address";
    pub const VESTING_RESERVE: &str = "vesting_reserve_address";
    pub const START_PRICE: &str = "start_price";
    pub const SELLING_COIN: &str = "selling_coin";
    pub const PAYING_COIN_DENOM: &str = "paying_coin_denom";
    pub const REMAINING_SELLING_COIN: &str = "remaining_selling_coin";
    pub const START_TIME: &str = "start_time";
    pub const END_TIME: &str = "end_time";
    pub const STATUS: &str = "auction_status";
    pub const MIN_BID_PRICE: &str = "min_bid_price";
    pub const MAX_EXTENDED_ROUND: &str = "max_extended_round";
    pub const EXTENDED_ROUND_RATE: &str = "extended_round_rate";
    pub const BIDDER: &str = "bidder_address";
    pub const BID_SEQUENCE: &str = "bid_sequence";
    pub const BID_PRICE: &str = "bid_price";
    pub const BID_COIN: &str = "bid_coin";
    pub const MATCHED_PRICE: &str = "matched_price";
    pub const MATCHED_LEN: &str = "matched_len";
    pub const RELEASE_TIME: &str = "release_time";
    pub const PAYING_COIN: &str = "paying_coin";
}
