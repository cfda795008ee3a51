//! Auction lifecycle: creation, cancellation, allowed bidders, extended
//! rounds, and finalization.

use fundraising_types::{
    validate_allowed_bidders, validate_vesting_schedules, Address, AllowedBidder, Auction,
    AuctionStatus, BaseAuction, BatchExtras, Coin, Dec, VestingSchedule,
};

use crate::error::FundraisingError;
use crate::event::{addr_hex, keys, types, Event};
use crate::host::{Bank, CallContext, EventSink, KvStore};
use crate::keeper::Keeper;
use crate::matching::MatchingInfo;

impl<K: KvStore, B: Bank, E: EventSink> Keeper<K, B, E> {
    fn validate_auction_creation(
        &self,
        ctx: &CallContext,
        start_price: &Dec,
        selling_coin: &Coin,
        paying_coin_denom: &str,
        vesting_schedules: &[VestingSchedule],
        start_time: u64,
        end_time: u64,
    ) -> Result<(), FundraisingError> {
        if end_time <= ctx.block_time {
            return Err(FundraisingError::InvalidRequest(
                "end time must be set after the current time".into(),
            ));
        }
        if end_time <= start_time {
            return Err(FundraisingError::InvalidRequest(
                "end time must be set after the start time".into(),
            ));
        }
        if !start_price.is_positive() {
            return Err(FundraisingError::InvalidRequest(
                "start price must be positive".into(),
            ));
        }
        if selling_coin.amount == 0 {
            return Err(FundraisingError::InvalidRequest(
                "selling coin amount must be positive".into(),
            ));
        }
        if selling_coin.denom == paying_coin_denom {
            return Err(FundraisingError::InvalidRequest(
                "selling and paying coin denoms must differ".into(),
            ));
        }
        validate_vesting_schedules(vesting_schedules, end_time)?;
        Ok(())
    }

    /// Creates a fixed-price auction, escrowing the selling coin and the
    /// creation fee from the auctioneer.
    #[allow(clippy::too_many_arguments)]
    pub fn create_fixed_price_auction(
        &mut self,
        ctx: &CallContext,
        start_price: Dec,
        selling_coin: Coin,
        paying_coin_denom: String,
        vesting_schedules: Vec<VestingSchedule>,
        start_time: u64,
        end_time: u64,
    ) -> Result<Auction, FundraisingError> {
        self.validate_auction_creation(
            ctx,
            &start_price,
            &selling_coin,
            &paying_coin_denom,
            &vesting_schedules,
            start_time,
            end_time,
        )?;
        self.ensure_creation_funds(ctx, &selling_coin)?;

        let id = self.next_auction_id_with_update();
        self.reserve_creation_fee(&ctx.sender)?;

        let mut base = BaseAuction::new(
            id,
            ctx.sender,
            start_price,
            selling_coin,
            paying_coin_denom,
            vesting_schedules,
            start_time,
            end_time,
        );
        if base.should_start(ctx.block_time) {
            base.status = AuctionStatus::Started;
        }
        let auction = Auction::FixedPrice(base);

        let selling_reserve = auction.base().selling_reserve_address;
        let selling = auction.base().selling_coin.clone();
        self.reserve_selling_coin(&selling_reserve, &ctx.sender, &selling)?;
        self.set_auction(&auction);

        let event = create_auction_event(types::CREATE_FIXED_PRICE_AUCTION, &auction);
        self.events_mut().emit(event);

        Ok(auction)
    }

    /// Creates a batch auction; identical to the fixed-price path plus the
    /// batch parameters.
    #[allow(clippy::too_many_arguments)]
    pub fn create_batch_auction(
        &mut self,
        ctx: &CallContext,
        start_price: Dec,
        selling_coin: Coin,
        paying_coin_denom: String,
        vesting_schedules: Vec<VestingSchedule>,
        min_bid_price: Dec,
        max_extended_round: u32,
        extended_round_rate: Dec,
        start_time: u64,
        end_time: u64,
    ) -> Result<Auction, FundraisingError> {
        self.validate_auction_creation(
            ctx,
            &start_price,
            &selling_coin,
            &paying_coin_denom,
            &vesting_schedules,
            start_time,
            end_time,
        )?;
        if !min_bid_price.is_positive() {
            return Err(FundraisingError::InvalidRequest(
                "minimum bid price must be positive".into(),
            ));
        }
        if extended_round_rate < Dec::zero() || extended_round_rate > Dec::one() {
            return Err(FundraisingError::InvalidRequest(
                "extended round rate must be between 0 and 1".into(),
            ));
        }
        self.ensure_creation_funds(ctx, &selling_coin)?;

        let id = self.next_auction_id_with_update();
        self.reserve_creation_fee(&ctx.sender)?;

        let mut base = BaseAuction::new(
            id,
            ctx.sender,
            start_price,
            selling_coin,
            paying_coin_denom,
            vesting_schedules,
            start_time,
            end_time,
        );
        if base.should_start(ctx.block_time) {
            base.status = AuctionStatus::Started;
        }
        let auction = Auction::Batch(
            base,
            BatchExtras {
                min_bid_price,
                matched_price: Dec::zero(),
                max_extended_round,
                extended_round_rate,
            },
        );

        let selling_reserve = auction.base().selling_reserve_address;
        let selling = auction.base().selling_coin.clone();
        self.reserve_selling_coin(&selling_reserve, &ctx.sender, &selling)?;
        self.set_auction(&auction);

        let mut event = create_auction_event(types::CREATE_BATCH_AUCTION, &auction);
        if let Auction::Batch(_, extras) = &auction {
            event = event
                .attr(keys::MIN_BID_PRICE, &extras.min_bid_price)
                .attr(keys::MAX_EXTENDED_ROUND, extras.max_extended_round)
                .attr(keys::EXTENDED_ROUND_RATE, &extras.extended_round_rate);
        }
        self.events_mut().emit(event);

        Ok(auction)
    }

    fn ensure_creation_funds(
        &self,
        ctx: &CallContext,
        selling_coin: &Coin,
    ) -> Result<(), FundraisingError> {
        let mut required = self.get_params().auction_creation_fee;
        required.push(selling_coin.clone());
        self.ensure_spendable(&ctx.sender, &required)
    }

    /// Cancels a stand-by auction and returns the escrowed inventory to the
    /// auctioneer. Only the auctioneer may cancel, and only before start.
    pub fn cancel_auction(
        &mut self,
        ctx: &CallContext,
        auction_id: u64,
    ) -> Result<(), FundraisingError> {
        let mut auction = self
            .get_auction(auction_id)
            .ok_or_else(|| FundraisingError::NotFound(format!("auction {auction_id}")))?;

        if auction.base().auctioneer != ctx.sender {
            return Err(FundraisingError::Unauthorized(
                "only the auctioneer can cancel the auction".into(),
            ));
        }
        if auction.status() != AuctionStatus::StandBy {
            return Err(FundraisingError::InvalidAuctionStatus(auction.status()));
        }

        self.release_selling_remaining(&auction)
            .map_err(FundraisingError::from)?;

        let base = auction.base_mut();
        base.remaining_selling_coin.amount = 0;
        base.status = AuctionStatus::Cancelled;
        self.set_auction(&auction);

        let event = Event::new(types::CANCEL_AUCTION).attr(keys::AUCTION_ID, auction_id);
        self.events_mut().emit(event);

        Ok(())
    }

    /// Registers new allowed bidders. Intended to be called by an external
    /// authorization module; no caller verification happens here.
    pub fn add_allowed_bidders(
        &mut self,
        auction_id: u64,
        bidders: Vec<AllowedBidder>,
    ) -> Result<(), FundraisingError> {
        let mut auction = self
            .get_auction(auction_id)
            .ok_or_else(|| FundraisingError::NotFound(format!("auction {auction_id}")))?;

        if !matches!(
            auction.status(),
            AuctionStatus::StandBy | AuctionStatus::Started
        ) {
            return Err(FundraisingError::InvalidAuctionStatus(auction.status()));
        }
        if bidders.is_empty() {
            return Err(FundraisingError::EmptyAllowedBidders);
        }

        let base = auction.base_mut();
        validate_allowed_bidders(&bidders, &base.allowed_bidders, base.selling_coin.amount)?;
        base.allowed_bidders.extend(bidders);
        self.set_auction(&auction);

        Ok(())
    }

    /// Replaces the maximum bid amount of an already registered bidder.
    pub fn update_allowed_bidder(
        &mut self,
        auction_id: u64,
        bidder: Address,
        max_bid_amount: u128,
    ) -> Result<(), FundraisingError> {
        let mut auction = self
            .get_auction(auction_id)
            .ok_or_else(|| FundraisingError::NotFound(format!("auction {auction_id}")))?;

        if !matches!(
            auction.status(),
            AuctionStatus::StandBy | AuctionStatus::Started
        ) {
            return Err(FundraisingError::InvalidAuctionStatus(auction.status()));
        }
        if max_bid_amount == 0 {
            return Err(FundraisingError::InvalidMaxBidAmount(
                "maximum bid amount must be positive".into(),
            ));
        }
        if max_bid_amount > auction.base().selling_coin.amount {
            return Err(FundraisingError::InvalidMaxBidAmount(
                "maximum bid amount exceeds the selling coin amount".into(),
            ));
        }
        if !auction.base_mut().set_max_bid_amount(&bidder, max_bid_amount) {
            return Err(FundraisingError::NotFound(format!(
                "bidder {} is not an allowed bidder",
                addr_hex(&bidder)
            )));
        }
        self.set_auction(&auction);

        Ok(())
    }

    /// Marks the auction started and announces it.
    pub(crate) fn start_auction(&mut self, auction: &mut Auction) {
        auction.base_mut().status = AuctionStatus::Started;
        self.set_auction(auction);

        let event = Event::new(types::AUCTION_STARTED)
            .attr(keys::AUCTION_ID, auction.id())
            .attr(keys::STATUS, AuctionStatus::Started);
        self.events_mut().emit(event);
    }

    /// Appends one extended round: a fresh end time one extended period past
    /// the current block time.
    pub(crate) fn extend_round(&mut self, auction: &mut Auction, block_time: u64) {
        let next_end = block_time + self.get_params().extended_period_secs();
        auction.base_mut().end_times.push(next_end);
        self.set_auction(auction);

        tracing::info!(
            auction_id = auction.id(),
            round = auction.base().end_times.len(),
            next_end,
            "extended auction round"
        );
        let event = Event::new(types::EXTENDED_ROUND)
            .attr(keys::AUCTION_ID, auction.id())
            .attr(keys::END_TIME, next_end);
        self.events_mut().emit(event);
    }

    /// Finalizes a fixed-price auction with the latest clearing.
    pub(crate) fn finish_fixed_price_auction(&mut self, auction: &mut Auction) {
        let matching_info = self.calculate_fixed_price_allocation(auction);
        self.settle(auction, &matching_info);
    }

    /// Finalizes a batch auction, or extends it by one round when the
    /// matched set shrank by at least the extended round rate.
    pub(crate) fn finish_batch_auction(&mut self, auction: &mut Auction, block_time: u64) {
        let extras = auction
            .batch_extras()
            .cloned()
            .unwrap_or_else(|| panic!("batch finish on a fixed price auction"));

        // no rounds left: settle unconditionally
        if extras.max_extended_round + 1 == auction.base().end_times.len() as u32 {
            let matching_info = self.calculate_batch_allocation(auction);
            self.settle(auction, &matching_info);
            return;
        }

        // nothing to compare against on the first pass: persist the clearing
        // and extend unconditionally
        let last_matched_len = self.get_matched_bids_len(auction.id());
        let matching_info = self.calculate_batch_allocation(auction);
        if last_matched_len == 0 {
            self.extend_round(auction, block_time);
            return;
        }

        let diff = Dec::one()
            - Dec::from_ratio(u128::from(matching_info.matched_len), u128::from(last_matched_len));
        if diff >= extras.extended_round_rate {
            self.extend_round(auction, block_time);
            return;
        }

        self.settle(auction, &matching_info);
    }

    /// Settlement: pay out allocations, return the remainder, refund, and
    /// enqueue vesting. Any failure here means corrupted reserves, so it is
    /// fatal to the block.
    fn settle(&mut self, auction: &mut Auction, matching_info: &MatchingInfo) {
        if let Err(err) = self.allocate_selling_coin(auction, matching_info) {
            panic!("failed to allocate selling coin: {err}");
        }

        let base = auction.base_mut();
        base.remaining_selling_coin.amount = base
            .remaining_selling_coin
            .amount
            .checked_sub(matching_info.total_matched_amount)
            .unwrap_or_else(|| panic!("matched amount exceeds the remaining selling coin"));

        if let Err(err) = self.release_selling_remaining(auction) {
            panic!("failed to release the remaining selling coin: {err}");
        }
        if let Err(err) = self.refund_paying_coin(auction, matching_info) {
            panic!("failed to refund the paying coin: {err}");
        }
        self.set_auction(auction);
        self.apply_vesting_schedules(auction);

        tracing::info!(
            auction_id = auction.id(),
            matched_price = %matching_info.matched_price,
            matched_len = matching_info.matched_len,
            total_matched_amount = matching_info.total_matched_amount,
            "finalized auction"
        );
        let event = Event::new(types::AUCTION_FINALIZED)
            .attr(keys::AUCTION_ID, auction.id())
            .attr(keys::MATCHED_PRICE, &matching_info.matched_price)
            .attr(keys::MATCHED_LEN, matching_info.matched_len)
            .attr(
                keys::REMAINING_SELLING_COIN,
                &auction.base().remaining_selling_coin,
            )
            .attr(keys::STATUS, auction.status());
        self.events_mut().emit(event);
    }
}

fn create_auction_event(ty: &str, auction: &Auction) -> Event {
    let base = auction.base();
    Event::new(ty)
        .attr(keys::AUCTION_ID, base.id)
        .attr(keys::AUCTIONEER, addr_hex(&base.auctioneer))
        .attr(keys::SELLING_RESERVE, addr_hex(&base.selling_reserve_address))
        .attr(keys::PAYING_RESERVE, addr_hex(&base.paying_reserve_address))
        .attr(keys::VESTING_RESERVE, addr_hex(&base.vesting_reserve_address))
        .attr(keys::START_PRICE, &base.start_price)
        .attr(keys::SELLING_COIN, &base.selling_coin)
        .attr(keys::PAYING_COIN_DENOM, &base.paying_coin_denom)
        .attr(
            keys::REMAINING_SELLING_COIN,
            &base.remaining_selling_coin,
        )
        .attr(keys::START_TIME, base.start_time)
        .attr(keys::END_TIME, base.end_time())
        .attr(keys::STATUS, base.status)
}
