//! Global engine parameters.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use fundraising_types::Coin;

/// Seconds per whole day; the extended period is expressed in days.
pub const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Params {
    /// Fee reserved from the auctioneer at creation and sent to the module
    /// fee collector. Fee policy is host-defined; the default charges
    /// nothing.
    pub auction_creation_fee: Vec<Coin>,
    /// Length of one extended round, whole days.
    pub extended_period_days: u32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            auction_creation_fee: Vec::new(),
            extended_period_days: 1,
        }
    }
}

impl Params {
    pub fn extended_period_secs(&self) -> u64 {
        u64::from(self.extended_period_days) * SECONDS_PER_DAY
    }
}
