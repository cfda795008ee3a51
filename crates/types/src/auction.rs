//! Auction records, statuses, and reserve-address derivation.

use std::collections::BTreeMap;
use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Address, Coin, Dec, ValidationError, VestingSchedule};

/// Name of the engine as used in address derivation and key scoping.
pub const MODULE_NAME: &str = "fundraising";

/// Auction lifecycle status.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum AuctionStatus {
    /// Created, waiting for the start time.
    StandBy,
    /// Accepting bids.
    Started,
    /// Finalized, proceeds releasing on the vesting schedule.
    Vesting,
    /// All vesting tranches released.
    Finished,
    /// Cancelled before start.
    Cancelled,
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            AuctionStatus::StandBy => "stand_by",
            AuctionStatus::Started => "started",
            AuctionStatus::Vesting => "vesting",
            AuctionStatus::Finished => "finished",
            AuctionStatus::Cancelled => "cancelled",
        };
        f.write_str(repr)
    }
}

/// A bidder authorized by an external module, with the cap on the total
/// selling-coin amount they may win.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct AllowedBidder {
    pub bidder: Address,
    pub max_bid_amount: u128,
}

/// Fields shared by both auction kinds.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct BaseAuction {
    pub id: u64,
    pub auctioneer: Address,
    pub selling_reserve_address: Address,
    pub paying_reserve_address: Address,
    pub vesting_reserve_address: Address,
    pub start_price: Dec,
    pub selling_coin: Coin,
    pub paying_coin_denom: String,
    pub remaining_selling_coin: Coin,
    pub vesting_schedules: Vec<VestingSchedule>,
    pub start_time: u64,
    /// Grows by one entry per extended round; the last element is the
    /// effective end.
    pub end_times: Vec<u64>,
    pub status: AuctionStatus,
    pub allowed_bidders: Vec<AllowedBidder>,
}

impl BaseAuction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        auctioneer: Address,
        start_price: Dec,
        selling_coin: Coin,
        paying_coin_denom: String,
        vesting_schedules: Vec<VestingSchedule>,
        start_time: u64,
        end_time: u64,
    ) -> Self {
        Self {
            id,
            auctioneer,
            selling_reserve_address: selling_reserve_address(id),
            paying_reserve_address: paying_reserve_address(id),
            vesting_reserve_address: vesting_reserve_address(id),
            start_price,
            remaining_selling_coin: selling_coin.clone(),
            selling_coin,
            paying_coin_denom,
            vesting_schedules,
            start_time,
            end_times: vec![end_time],
            status: AuctionStatus::StandBy,
            allowed_bidders: Vec::new(),
        }
    }

    pub fn should_start(&self, block_time: u64) -> bool {
        block_time >= self.start_time
    }

    /// The effective end, i.e. the last entry of `end_times`.
    pub fn end_time(&self) -> u64 {
        *self
            .end_times
            .last()
            .unwrap_or_else(|| panic!("auction {} has no end time", self.id))
    }

    pub fn should_finish(&self, block_time: u64) -> bool {
        block_time >= self.end_time()
    }

    pub fn allowed_bidders_map(&self) -> BTreeMap<Address, u128> {
        self.allowed_bidders
            .iter()
            .map(|ab| (ab.bidder, ab.max_bid_amount))
            .collect()
    }

    /// Replaces the cap of an existing allowed bidder. Returns false when the
    /// bidder is unknown.
    pub fn set_max_bid_amount(&mut self, bidder: &Address, max_bid_amount: u128) -> bool {
        match self.allowed_bidders.iter_mut().find(|ab| ab.bidder == *bidder) {
            Some(ab) => {
                ab.max_bid_amount = max_bid_amount;
                true
            }
            None => false,
        }
    }
}

/// Fields specific to batch auctions.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct BatchExtras {
    pub min_bid_price: Dec,
    /// The uniform clearing price, set by the latest clearing pass.
    pub matched_price: Dec,
    pub max_extended_round: u32,
    pub extended_round_rate: Dec,
}

/// An auction record, dispatched by kind.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum Auction {
    FixedPrice(BaseAuction),
    Batch(BaseAuction, BatchExtras),
}

impl Auction {
    pub fn base(&self) -> &BaseAuction {
        match self {
            Auction::FixedPrice(base) => base,
            Auction::Batch(base, _) => base,
        }
    }

    pub fn base_mut(&mut self) -> &mut BaseAuction {
        match self {
            Auction::FixedPrice(base) => base,
            Auction::Batch(base, _) => base,
        }
    }

    pub fn batch_extras(&self) -> Option<&BatchExtras> {
        match self {
            Auction::FixedPrice(_) => None,
            Auction::Batch(_, extras) => Some(extras),
        }
    }

    pub fn batch_extras_mut(&mut self) -> Option<&mut BatchExtras> {
        match self {
            Auction::FixedPrice(_) => None,
            Auction::Batch(_, extras) => Some(extras),
        }
    }

    pub fn id(&self) -> u64 {
        self.base().id
    }

    pub fn status(&self) -> AuctionStatus {
        self.base().status
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Auction::FixedPrice(_) => "fixed_price",
            Auction::Batch(..) => "batch",
        }
    }
}

/// Validates a batch of allowed bidders against the auction inventory and the
/// already registered entries. Duplicates are rejected rather than deduped.
pub fn validate_allowed_bidders(
    new_bidders: &[AllowedBidder],
    existing: &[AllowedBidder],
    selling_coin_amount: u128,
) -> Result<(), ValidationError> {
    if new_bidders.is_empty() {
        return Err(ValidationError::EmptyAllowedBidders);
    }

    let mut seen: BTreeMap<Address, ()> =
        existing.iter().map(|ab| (ab.bidder, ())).collect();
    for ab in new_bidders {
        if ab.max_bid_amount == 0 {
            return Err(ValidationError::InvalidMaxBidAmount(
                "maximum bid amount must be positive".into(),
            ));
        }
        if ab.max_bid_amount > selling_coin_amount {
            return Err(ValidationError::InvalidMaxBidAmount(format!(
                "maximum bid amount {} exceeds the selling coin amount {}",
                ab.max_bid_amount, selling_coin_amount
            )));
        }
        if seen.insert(ab.bidder, ()).is_some() {
            return Err(ValidationError::DuplicateBidder);
        }
    }
    Ok(())
}

fn derive_module_address(role: &str, id: u64) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(MODULE_NAME.as_bytes());
    hasher.update(b"/");
    hasher.update(role.as_bytes());
    hasher.update(b"/");
    hasher.update(id.to_be_bytes());
    hasher.finalize().into()
}

/// Escrow address holding the inventory offered for sale.
pub fn selling_reserve_address(auction_id: u64) -> Address {
    derive_module_address("selling_reserve", auction_id)
}

/// Escrow address holding bidders' paying coins.
pub fn paying_reserve_address(auction_id: u64) -> Address {
    derive_module_address("paying_reserve", auction_id)
}

/// Escrow address holding proceeds until vesting tranches release.
pub fn vesting_reserve_address(auction_id: u64) -> Address {
    derive_module_address("vesting_reserve", auction_id)
}

/// Module-scoped collector for auction creation fees.
pub fn fee_collector_address() -> Address {
    derive_module_address("fee_collector", 0)
}
