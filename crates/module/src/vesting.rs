//! Vesting: enqueueing proceeds at finalization and releasing due tranches
//! per block.

use fundraising_types::{Auction, AuctionStatus, Coin, VestingQueue};

use crate::event::{keys, types, Event};
use crate::host::{Bank, EventSink, KvStore};
use crate::keeper::Keeper;

impl<K: KvStore, B: Bank, E: EventSink> Keeper<K, B, E> {
    /// Moves the post-refund paying-reserve balance into the vesting reserve
    /// and enqueues one tranche per schedule step. Tranche amounts are
    /// floored per weight; the last tranche takes the remainder so that the
    /// tranches sum to the total. With no proceeds there is nothing to vest
    /// and the auction finishes outright.
    pub(crate) fn apply_vesting_schedules(&mut self, auction: &mut Auction) {
        let base = auction.base().clone();
        let total = self
            .bank()
            .spendable(&base.paying_reserve_address, &base.paying_coin_denom);

        if base.vesting_schedules.is_empty() || total == 0 {
            if total > 0 {
                let proceeds = Coin::new(base.paying_coin_denom.clone(), total);
                if let Err(err) = self.bank_mut().send(
                    &base.paying_reserve_address,
                    &base.auctioneer,
                    &[proceeds],
                ) {
                    panic!("failed to release the paying coin to the auctioneer: {err}");
                }
            }
            self.finish_auction(auction);
            return;
        }

        let vesting_total = Coin::new(base.paying_coin_denom.clone(), total);
        if let Err(err) = self.bank_mut().send(
            &base.paying_reserve_address,
            &base.vesting_reserve_address,
            &[vesting_total],
        ) {
            panic!("failed to reserve the vesting coin: {err}");
        }

        let last = base.vesting_schedules.len() - 1;
        let mut left = total;
        for (i, schedule) in base.vesting_schedules.iter().enumerate() {
            let amount = if i == last {
                left
            } else {
                schedule
                    .weight
                    .mul_floor(total)
                    .unwrap_or_else(|| panic!("vesting tranche amount overflow"))
            };
            left = left
                .checked_sub(amount)
                .unwrap_or_else(|| panic!("vesting tranches exceed the total proceeds"));

            self.set_vesting_queue(&VestingQueue {
                auction_id: base.id,
                release_time: schedule.release_time,
                paying_coin: Coin::new(base.paying_coin_denom.clone(), amount),
                released: false,
            });
        }

        auction.base_mut().status = AuctionStatus::Vesting;
        self.set_auction(auction);
    }

    /// Releases every due, unreleased tranche to the auctioneer. The auction
    /// finishes when the last queue entry releases. A failing transfer is
    /// fatal: the vesting reserve is guaranteed to hold each tranche.
    pub(crate) fn release_vesting_paying_coin(&mut self, auction: &mut Auction, block_time: u64) {
        let base = auction.base().clone();
        let queues = self.get_vesting_queues_by_auction(base.id);
        let last = queues.len().saturating_sub(1);

        for (i, mut queue) in queues.into_iter().enumerate() {
            if !queue.should_release(block_time) {
                continue;
            }

            if queue.paying_coin.amount > 0 {
                if let Err(err) = self.bank_mut().send(
                    &base.vesting_reserve_address,
                    &base.auctioneer,
                    &[queue.paying_coin.clone()],
                ) {
                    panic!("failed to release the paying coin to the auctioneer: {err}");
                }
            }
            queue.released = true;
            self.set_vesting_queue(&queue);

            tracing::debug!(
                auction_id = base.id,
                release_time = queue.release_time,
                amount = queue.paying_coin.amount,
                "released vesting tranche"
            );
            let event = Event::new(types::VESTING_RELEASED)
                .attr(keys::AUCTION_ID, base.id)
                .attr(keys::RELEASE_TIME, queue.release_time)
                .attr(keys::PAYING_COIN, &queue.paying_coin);
            self.events_mut().emit(event);

            if i == last {
                self.finish_auction(auction);
            }
        }
    }

    fn finish_auction(&mut self, auction: &mut Auction) {
        auction.base_mut().status = AuctionStatus::Finished;
        self.set_auction(auction);

        let event = Event::new(types::AUCTION_FINISHED)
            .attr(keys::AUCTION_ID, auction.id())
            .attr(keys::STATUS, AuctionStatus::Finished);
        self.events_mut().emit(event);
    }
}
