//! Core type definitions for the fundraising auction engine.
//!
//! This crate provides the shared data structures used across the engine:
//! coins, exact decimals, auction and bid records, vesting schedules, and the
//! deterministic reserve-address derivations.

pub mod auction;
pub mod bid;
pub mod coin;
pub mod dec;
pub mod vesting;

pub use auction::{
    fee_collector_address, paying_reserve_address, selling_reserve_address,
    validate_allowed_bidders, vesting_reserve_address, AllowedBidder, Auction, AuctionStatus,
    BaseAuction, BatchExtras, MODULE_NAME,
};
pub use bid::{Bid, BidType};
pub use coin::Coin;
pub use dec::Dec;
pub use vesting::{validate_vesting_schedules, VestingQueue, VestingSchedule};

use thiserror::Error;

/// Generic account address (32 bytes).
pub type Address = [u8; 32];

/// Errors produced by stateless validation of auction inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("allowed bidder list must not be empty")]
    EmptyAllowedBidders,

    #[error("invalid maximum bid amount: {0}")]
    InvalidMaxBidAmount(String),

    #[error("duplicate allowed bidder")]
    DuplicateBidder,

    #[error("invalid vesting schedules: {0}")]
    InvalidVestingSchedules(String),

    #[error("invalid decimal: {0}")]
    InvalidDecimal(String),
}
