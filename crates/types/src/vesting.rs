//! Vesting schedules and release queues.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{Coin, Dec, ValidationError};

/// A single step of an auctioneer payout schedule.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct VestingSchedule {
    pub release_time: u64,
    /// Fraction of the total proceeds released at `release_time`. Weights
    /// across a schedule sum to exactly 1.
    pub weight: Dec,
}

/// One enqueued payout tranche, created at finalization.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct VestingQueue {
    pub auction_id: u64,
    pub release_time: u64,
    pub paying_coin: Coin,
    pub released: bool,
}

impl VestingQueue {
    pub fn should_release(&self, block_time: u64) -> bool {
        !self.released && self.release_time <= block_time
    }
}

/// Validates a vesting schedule against the auction end time: at least one
/// entry, strictly increasing release times all after `end_time`, positive
/// weights each at most 1, summing to exactly 1.
pub fn validate_vesting_schedules(
    schedules: &[VestingSchedule],
    end_time: u64,
) -> Result<(), ValidationError> {
    if schedules.is_empty() {
        return Err(ValidationError::InvalidVestingSchedules(
            "at least one vesting schedule is required".into(),
        ));
    }

    let mut total_weight = Dec::zero();
    let mut last_release_time = end_time;
    for (i, schedule) in schedules.iter().enumerate() {
        if !schedule.weight.is_positive() {
            return Err(ValidationError::InvalidVestingSchedules(
                "vesting weight must be positive".into(),
            ));
        }
        if schedule.weight > Dec::one() {
            return Err(ValidationError::InvalidVestingSchedules(
                "vesting weight must not be greater than 1".into(),
            ));
        }
        if schedule.release_time <= last_release_time {
            let reason = if i == 0 {
                "release time must be after the auction end time"
            } else {
                "release times must be strictly increasing"
            };
            return Err(ValidationError::InvalidVestingSchedules(reason.into()));
        }
        last_release_time = schedule.release_time;
        total_weight = total_weight + schedule.weight.clone();
    }

    if total_weight != Dec::one() {
        return Err(ValidationError::InvalidVestingSchedules(
            "vesting weights must sum to exactly 1".into(),
        ));
    }
    Ok(())
}
