//! Engine error types.

use thiserror::Error;

use fundraising_types::{AuctionStatus, ValidationError};

use crate::host::BankError;

/// Errors returned by message handlers.
///
/// Every kind carries a distinct stable code, reported as the non-zero exit
/// code of the rejected message. Input-validation errors leave state
/// untouched; invariant violations inside finalization do not surface here —
/// they panic and roll the block back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FundraisingError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid auction status: {0}")]
    InvalidAuctionStatus(AuctionStatus),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("allowed bidder list must not be empty")]
    EmptyAllowedBidders,

    #[error("invalid maximum bid amount: {0}")]
    InvalidMaxBidAmount(String),

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),
}

impl FundraisingError {
    /// Stable per-kind code; zero is reserved for success.
    pub fn code(&self) -> u32 {
        match self {
            FundraisingError::InvalidRequest(_) => 2,
            FundraisingError::Unauthorized(_) => 3,
            FundraisingError::InvalidAuctionStatus(_) => 4,
            FundraisingError::NotFound(_) => 5,
            FundraisingError::EmptyAllowedBidders => 6,
            FundraisingError::InvalidMaxBidAmount(_) => 7,
            FundraisingError::InsufficientFunds(_) => 8,
        }
    }
}

impl From<ValidationError> for FundraisingError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyAllowedBidders => FundraisingError::EmptyAllowedBidders,
            ValidationError::InvalidMaxBidAmount(reason) => {
                FundraisingError::InvalidMaxBidAmount(reason)
            }
            ValidationError::DuplicateBidder
            | ValidationError::InvalidVestingSchedules(_)
            | ValidationError::InvalidDecimal(_) => {
                FundraisingError::InvalidRequest(err.to_string())
            }
        }
    }
}

impl From<BankError> for FundraisingError {
    fn from(err: BankError) -> Self {
        FundraisingError::InsufficientFunds(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_distinct_and_nonzero() {
        let errors = [
            FundraisingError::InvalidRequest(String::new()),
            FundraisingError::Unauthorized(String::new()),
            FundraisingError::InvalidAuctionStatus(AuctionStatus::StandBy),
            FundraisingError::NotFound(String::new()),
            FundraisingError::EmptyAllowedBidders,
            FundraisingError::InvalidMaxBidAmount(String::new()),
            FundraisingError::InsufficientFunds(String::new()),
        ];
        let mut codes: Vec<u32> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(codes.iter().all(|&c| c != 0));
    }
}
