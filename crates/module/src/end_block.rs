//! End-of-block sweep.
//!
//! The host invokes this once per block, strictly after all transactions.
//! It drives every time-triggered transition: StandBy auctions start,
//! overdue Started auctions finalize or extend, and Vesting auctions release
//! due tranches. The sweep is idempotent within a single block time.

use fundraising_types::{Auction, AuctionStatus};

use crate::host::{Bank, BlockContext, EventSink, KvStore};
use crate::keeper::Keeper;

impl<K: KvStore, B: Bank, E: EventSink> Keeper<K, B, E> {
    pub fn end_block(&mut self, ctx: &BlockContext) {
        for mut auction in self.iter_auctions() {
            match auction.status() {
                AuctionStatus::StandBy | AuctionStatus::Started => {
                    if auction.status() == AuctionStatus::StandBy
                        && auction.base().should_start(ctx.block_time)
                    {
                        self.start_auction(&mut auction);
                    }
                    if auction.status() == AuctionStatus::Started
                        && auction.base().should_finish(ctx.block_time)
                    {
                        tracing::debug!(
                            auction_id = auction.id(),
                            block_time = ctx.block_time,
                            "auction reached its end time"
                        );
                        match &auction {
                            Auction::FixedPrice(_) => {
                                self.finish_fixed_price_auction(&mut auction)
                            }
                            Auction::Batch(..) => {
                                self.finish_batch_auction(&mut auction, ctx.block_time)
                            }
                        }
                    }
                }
                AuctionStatus::Vesting => {
                    self.release_vesting_paying_coin(&mut auction, ctx.block_time);
                }
                AuctionStatus::Finished | AuctionStatus::Cancelled => {}
            }
        }
    }
}
