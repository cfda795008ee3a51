//! RPC parameter and response types for the mock chain.
//!
//! Addresses travel as hex strings, amounts and decimals as strings, so the
//! JSON surface stays precise for arbitrarily large values.

use serde::{Deserialize, Serialize};

use fundraising_module::event::Event;
use fundraising_types::{Auction, Bid, BidType, Coin, VestingQueue, VestingSchedule};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    pub timestamp: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoinRpc {
    pub denom: String,
    pub amount: String,
}

impl From<&Coin> for CoinRpc {
    fn from(coin: &Coin) -> Self {
        Self {
            denom: coin.denom.clone(),
            amount: coin.amount.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VestingScheduleRpc {
    pub release_time: u64,
    pub weight: String,
}

impl From<&VestingSchedule> for VestingScheduleRpc {
    fn from(schedule: &VestingSchedule) -> Self {
        Self {
            release_time: schedule.release_time,
            weight: schedule.weight.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AllowedBidderRpc {
    pub bidder: String,
    pub max_bid_amount: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateFixedPriceAuctionParams {
    pub sender: String,
    pub start_price: String,
    pub selling_coin: CoinRpc,
    pub paying_coin_denom: String,
    pub vesting_schedules: Vec<VestingScheduleRpc>,
    pub start_time: u64,
    pub end_time: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateBatchAuctionParams {
    pub sender: String,
    pub start_price: String,
    pub selling_coin: CoinRpc,
    pub paying_coin_denom: String,
    pub vesting_schedules: Vec<VestingScheduleRpc>,
    pub min_bid_price: String,
    pub max_extended_round: u32,
    pub extended_round_rate: String,
    pub start_time: u64,
    pub end_time: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaceBidParams {
    pub sender: String,
    pub auction_id: u64,
    pub bid_type: String,
    pub price: String,
    pub coin: CoinRpc,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModifyBidParams {
    pub sender: String,
    pub auction_id: u64,
    pub sequence: u64,
    pub price: String,
    pub coin: CoinRpc,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuctionRpc {
    pub id: u64,
    pub auction_type: String,
    pub auctioneer: String,
    pub selling_reserve_address: String,
    pub paying_reserve_address: String,
    pub vesting_reserve_address: String,
    pub start_price: String,
    pub selling_coin: CoinRpc,
    pub paying_coin_denom: String,
    pub remaining_selling_coin: CoinRpc,
    pub vesting_schedules: Vec<VestingScheduleRpc>,
    pub start_time: u64,
    pub end_times: Vec<u64>,
    pub status: String,
    pub allowed_bidders: Vec<AllowedBidderRpc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_bid_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_extended_round: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_round_rate: Option<String>,
}

impl From<&Auction> for AuctionRpc {
    fn from(auction: &Auction) -> Self {
        let base = auction.base();
        let extras = auction.batch_extras();
        Self {
            id: base.id,
            auction_type: auction.type_name().to_string(),
            auctioneer: hex::encode(base.auctioneer),
            selling_reserve_address: hex::encode(base.selling_reserve_address),
            paying_reserve_address: hex::encode(base.paying_reserve_address),
            vesting_reserve_address: hex::encode(base.vesting_reserve_address),
            start_price: base.start_price.to_string(),
            selling_coin: CoinRpc::from(&base.selling_coin),
            paying_coin_denom: base.paying_coin_denom.clone(),
            remaining_selling_coin: CoinRpc::from(&base.remaining_selling_coin),
            vesting_schedules: base
                .vesting_schedules
                .iter()
                .map(VestingScheduleRpc::from)
                .collect(),
            start_time: base.start_time,
            end_times: base.end_times.clone(),
            status: base.status.to_string(),
            allowed_bidders: base
                .allowed_bidders
                .iter()
                .map(|ab| AllowedBidderRpc {
                    bidder: hex::encode(ab.bidder),
                    max_bid_amount: ab.max_bid_amount.to_string(),
                })
                .collect(),
            min_bid_price: extras.map(|e| e.min_bid_price.to_string()),
            matched_price: extras.map(|e| e.matched_price.to_string()),
            max_extended_round: extras.map(|e| e.max_extended_round),
            extended_round_rate: extras.map(|e| e.extended_round_rate.to_string()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BidRpc {
    pub auction_id: u64,
    pub sequence: u64,
    pub bidder: String,
    pub price: String,
    pub coin: CoinRpc,
    pub bid_type: String,
    pub is_matched: bool,
}

impl From<&Bid> for BidRpc {
    fn from(bid: &Bid) -> Self {
        let bid_type = match bid.bid_type {
            BidType::FixedPrice => "fixed_price",
            BidType::BatchWorth => "batch_worth",
            BidType::BatchMany => "batch_many",
        };
        Self {
            auction_id: bid.auction_id,
            sequence: bid.sequence,
            bidder: hex::encode(bid.bidder),
            price: bid.price.to_string(),
            coin: CoinRpc::from(&bid.coin),
            bid_type: bid_type.to_string(),
            is_matched: bid.is_matched,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VestingQueueRpc {
    pub auction_id: u64,
    pub release_time: u64,
    pub paying_coin: CoinRpc,
    pub released: bool,
}

impl From<&VestingQueue> for VestingQueueRpc {
    fn from(queue: &VestingQueue) -> Self {
        Self {
            auction_id: queue.auction_id,
            release_time: queue.release_time,
            paying_coin: CoinRpc::from(&queue.paying_coin),
            released: queue.released,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventRpc {
    pub ty: String,
    pub attributes: Vec<(String, String)>,
}

impl From<&Event> for EventRpc {
    fn from(event: &Event) -> Self {
        Self {
            ty: event.ty.clone(),
            attributes: event.attributes.clone(),
        }
    }
}
