//! Call messages for the fundraising engine.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use fundraising_types::{Address, AllowedBidder, BidType, Coin, Dec, VestingSchedule};

use crate::error::FundraisingError;
use crate::host::{Bank, CallContext, EventSink, KvStore};
use crate::keeper::Keeper;

/// Messages accepted by the engine. Dispatch returns exit code 0 on success
/// and the error's stable code otherwise.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum FundraisingCall {
    CreateFixedPriceAuction {
        auctioneer: Address,
        start_price: Dec,
        selling_coin: Coin,
        paying_coin_denom: String,
        vesting_schedules: Vec<VestingSchedule>,
        start_time: u64,
        end_time: u64,
    },

    CreateBatchAuction {
        auctioneer: Address,
        start_price: Dec,
        selling_coin: Coin,
        paying_coin_denom: String,
        vesting_schedules: Vec<VestingSchedule>,
        min_bid_price: Dec,
        max_extended_round: u32,
        extended_round_rate: Dec,
        start_time: u64,
        end_time: u64,
    },

    CancelAuction {
        auctioneer: Address,
        auction_id: u64,
    },

    /// Intended to be called by an external authorization module, not the
    /// auctioneer directly.
    AddAllowedBidders {
        auction_id: u64,
        allowed_bidders: Vec<AllowedBidder>,
    },

    UpdateAllowedBidder {
        auction_id: u64,
        bidder: Address,
        max_bid_amount: u128,
    },

    PlaceBid {
        auction_id: u64,
        bidder: Address,
        bid_type: BidType,
        price: Dec,
        coin: Coin,
    },

    ModifyBid {
        auction_id: u64,
        bidder: Address,
        sequence: u64,
        price: Dec,
        coin: Coin,
    },
}

fn ensure_sender(ctx: &CallContext, signer: &Address) -> Result<(), FundraisingError> {
    if ctx.sender != *signer {
        return Err(FundraisingError::Unauthorized(
            "message signer does not match the sender".into(),
        ));
    }
    Ok(())
}

impl<K: KvStore, B: Bank, E: EventSink> Keeper<K, B, E> {
    /// Routes a call message to its handler.
    pub fn dispatch(
        &mut self,
        ctx: &CallContext,
        call: FundraisingCall,
    ) -> Result<(), FundraisingError> {
        match call {
            FundraisingCall::CreateFixedPriceAuction {
                auctioneer,
                start_price,
                selling_coin,
                paying_coin_denom,
                vesting_schedules,
                start_time,
                end_time,
            } => {
                ensure_sender(ctx, &auctioneer)?;
                self.create_fixed_price_auction(
                    ctx,
                    start_price,
                    selling_coin,
                    paying_coin_denom,
                    vesting_schedules,
                    start_time,
                    end_time,
                )?;
                Ok(())
            }
            FundraisingCall::CreateBatchAuction {
                auctioneer,
                start_price,
                selling_coin,
                paying_coin_denom,
                vesting_schedules,
                min_bid_price,
                max_extended_round,
                extended_round_rate,
                start_time,
                end_time,
            } => {
                ensure_sender(ctx, &auctioneer)?;
                self.create_batch_auction(
                    ctx,
                    start_price,
                    selling_coin,
                    paying_coin_denom,
                    vesting_schedules,
                    min_bid_price,
                    max_extended_round,
                    extended_round_rate,
                    start_time,
                    end_time,
                )?;
                Ok(())
            }
            FundraisingCall::CancelAuction {
                auctioneer,
                auction_id,
            } => {
                ensure_sender(ctx, &auctioneer)?;
                self.cancel_auction(ctx, auction_id)
            }
            FundraisingCall::AddAllowedBidders {
                auction_id,
                allowed_bidders,
            } => self.add_allowed_bidders(auction_id, allowed_bidders),
            FundraisingCall::UpdateAllowedBidder {
                auction_id,
                bidder,
                max_bid_amount,
            } => self.update_allowed_bidder(auction_id, bidder, max_bid_amount),
            FundraisingCall::PlaceBid {
                auction_id,
                bidder,
                bid_type,
                price,
                coin,
            } => {
                ensure_sender(ctx, &bidder)?;
                self.place_bid(ctx, auction_id, bid_type, price, coin)?;
                Ok(())
            }
            FundraisingCall::ModifyBid {
                auction_id,
                bidder,
                sequence,
                price,
                coin,
            } => {
                ensure_sender(ctx, &bidder)?;
                self.modify_bid(ctx, auction_id, sequence, price, coin)?;
                Ok(())
            }
        }
    }
}
