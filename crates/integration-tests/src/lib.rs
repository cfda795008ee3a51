//! End-to-end tests for the fundraising auction engine.
//!
//! These drive full auction lifecycles through the in-memory host harness:
//! creation, bidding, the end-of-block sweep, clearing, extended rounds,
//! settlement, and vesting payout.

#[cfg(test)]
mod scenarios {
    use fundraising_module::testing::{addr, TestApp};
    use fundraising_module::FundraisingError;
    use fundraising_types::{
        selling_reserve_address, AllowedBidder, AuctionStatus, BidType, Coin, Dec,
        VestingSchedule,
    };

    const SELL: &str = "denom1";
    const PAY: &str = "denom2";
    const DAY: u64 = 86_400;
    const END: u64 = 10_000;

    fn schedule(release_time: u64, weight: &str) -> VestingSchedule {
        VestingSchedule {
            release_time,
            weight: weight.parse().unwrap(),
        }
    }

    fn dec(s: &str) -> Dec {
        s.parse().unwrap()
    }

    fn create_fixed_price(app: &mut TestApp, schedules: Vec<VestingSchedule>) -> u64 {
        app.fund(addr(0), Coin::new(SELL, 1_000));
        let ctx = app.ctx(addr(0));
        app.keeper
            .create_fixed_price_auction(
                &ctx,
                dec("1.0"),
                Coin::new(SELL, 1_000),
                PAY.into(),
                schedules,
                0,
                END,
            )
            .unwrap()
            .id()
    }

    fn create_batch(
        app: &mut TestApp,
        max_extended_round: u32,
        extended_round_rate: &str,
    ) -> u64 {
        app.fund(addr(0), Coin::new(SELL, 1_000));
        let ctx = app.ctx(addr(0));
        app.keeper
            .create_batch_auction(
                &ctx,
                dec("1.0"),
                Coin::new(SELL, 1_000),
                PAY.into(),
                vec![schedule(1_000_000, "1")],
                dec("1.0"),
                max_extended_round,
                dec(extended_round_rate),
                0,
                END,
            )
            .unwrap()
            .id()
    }

    fn allow(app: &mut TestApp, auction_id: u64, bidder: u8, max: u128) {
        app.keeper
            .add_allowed_bidders(
                auction_id,
                vec![AllowedBidder {
                    bidder: addr(bidder),
                    max_bid_amount: max,
                }],
            )
            .unwrap();
    }

    fn place_bid(
        app: &mut TestApp,
        auction_id: u64,
        bidder: u8,
        bid_type: BidType,
        price: &str,
        coin: Coin,
    ) -> u64 {
        let ctx = app.ctx(addr(bidder));
        app.keeper
            .place_bid(&ctx, auction_id, bid_type, dec(price), coin)
            .unwrap()
            .sequence
    }

    #[test]
    fn basic_fixed_price_sale() {
        let mut app = TestApp::new();
        let id = create_fixed_price(&mut app, vec![schedule(END + DAY, "1")]);
        allow(&mut app, id, 1, 600);
        app.fund(addr(1), Coin::new(PAY, 500));

        app.advance_to(100);
        place_bid(&mut app, id, 1, BidType::FixedPrice, "1.0", Coin::new(PAY, 500));

        app.advance_to(END);
        let auction = app.keeper.get_auction(id).unwrap();
        assert_eq!(auction.status(), AuctionStatus::Vesting);
        assert_eq!(auction.base().remaining_selling_coin.amount, 500);

        // inventory escrowed = remaining + allocations paid out
        assert_eq!(app.balance(addr(1), SELL), 500);
        assert_eq!(app.balance(addr(0), SELL), 500);
        assert_eq!(app.balance(addr(1), PAY), 0);

        // reserves drained into the vesting reserve
        assert_eq!(app.balance(auction.base().selling_reserve_address, SELL), 0);
        assert_eq!(app.balance(auction.base().paying_reserve_address, PAY), 0);
        assert_eq!(app.balance(auction.base().vesting_reserve_address, PAY), 500);

        app.advance_to(END + DAY);
        assert_eq!(app.balance(addr(0), PAY), 500);
        assert_eq!(
            app.keeper.get_auction(id).unwrap().status(),
            AuctionStatus::Finished
        );

        let emitted: Vec<&str> = app
            .keeper
            .events()
            .all()
            .iter()
            .map(|event| event.ty.as_str())
            .collect();
        for expected in [
            "create_fixed_price_auction",
            "place_bid",
            "auction_finalized",
            "vesting_released",
            "auction_finished",
        ] {
            assert!(emitted.contains(&expected), "missing event {expected}");
        }
    }

    #[test]
    fn fixed_price_oversubscription_truncates_and_refunds() {
        let mut app = TestApp::new();
        let id = create_fixed_price(&mut app, vec![schedule(END + DAY, "1")]);
        allow(&mut app, id, 1, 600);
        allow(&mut app, id, 2, 600);
        app.fund(addr(1), Coin::new(PAY, 700));
        app.fund(addr(2), Coin::new(PAY, 700));

        app.advance_to(100);
        place_bid(&mut app, id, 1, BidType::FixedPrice, "1.0", Coin::new(PAY, 700));
        place_bid(&mut app, id, 2, BidType::FixedPrice, "1.0", Coin::new(PAY, 700));

        app.advance_to(END);
        // the first bidder hits their cap, the second takes what is left
        assert_eq!(app.balance(addr(1), SELL), 600);
        assert_eq!(app.balance(addr(2), SELL), 400);
        assert_eq!(app.balance(addr(1), PAY), 100);
        assert_eq!(app.balance(addr(2), PAY), 300);

        // cap safety held and the full inventory sold
        let auction = app.keeper.get_auction(id).unwrap();
        assert_eq!(auction.base().remaining_selling_coin.amount, 0);
        assert_eq!(app.balance(addr(0), SELL), 0);
        assert_eq!(app.balance(auction.base().vesting_reserve_address, PAY), 1_000);
    }

    #[test]
    fn batch_uniform_clearing() {
        let mut app = TestApp::new();
        let id = create_batch(&mut app, 0, "0.3");
        for bidder in 1..=3 {
            allow(&mut app, id, bidder, 1_000);
        }
        app.fund(addr(1), Coin::new(PAY, 800));
        app.fund(addr(2), Coin::new(PAY, 750));
        app.fund(addr(3), Coin::new(PAY, 300));

        app.advance_to(100);
        place_bid(&mut app, id, 1, BidType::BatchMany, "2.0", Coin::new(SELL, 400));
        place_bid(&mut app, id, 2, BidType::BatchMany, "1.5", Coin::new(SELL, 500));
        place_bid(&mut app, id, 3, BidType::BatchMany, "1.0", Coin::new(SELL, 300));

        app.advance_to(END);
        let auction = app.keeper.get_auction(id).unwrap();
        assert_eq!(auction.status(), AuctionStatus::Vesting);
        assert_eq!(auction.batch_extras().unwrap().matched_price, dec("1.5"));

        assert_eq!(app.balance(addr(1), SELL), 400);
        assert_eq!(app.balance(addr(2), SELL), 500);
        assert_eq!(app.balance(addr(3), SELL), 0);

        // X escrowed 800, pays 400 × 1.5; Z is fully refunded
        assert_eq!(app.balance(addr(1), PAY), 200);
        assert_eq!(app.balance(addr(2), PAY), 0);
        assert_eq!(app.balance(addr(3), PAY), 300);

        // 100 unsold units return to the auctioneer, proceeds vest
        assert_eq!(app.balance(addr(0), SELL), 100);
        assert_eq!(app.balance(auction.base().vesting_reserve_address, PAY), 1_350);

        // payment conservation: Σ paid = matched price × Σ allocation
        assert_eq!(600 + 750, 1_350);
    }

    #[test]
    fn batch_anti_sniping_extension() {
        let mut app = TestApp::new();
        let id = create_batch(&mut app, 5, "0.3");
        for bidder in 1..=10u8 {
            allow(&mut app, id, bidder, 100);
        }
        for bidder in 1..=10u8 {
            app.fund(addr(bidder), Coin::new(PAY, 200));
        }

        app.advance_to(100);
        let mut sequences = Vec::new();
        for bidder in 1..=10u8 {
            sequences.push(place_bid(
                &mut app,
                id,
                bidder,
                BidType::BatchMany,
                "1.0",
                Coin::new(SELL, 80),
            ));
        }

        // round 1: everything matches at 1.0; with no previous round to
        // compare, the controller extends unconditionally
        app.advance_to(END);
        let auction = app.keeper.get_auction(id).unwrap();
        assert_eq!(auction.status(), AuctionStatus::Started);
        assert_eq!(auction.base().end_times.len(), 2);
        assert_eq!(app.keeper.get_matched_bids_len(id), 10);
        let round_two_end = auction.base().end_time();

        // half the bidders outbid themselves to 2.0; at the new clearing
        // price the matched set shrinks from 10 to 5, diff 0.5 ≥ 0.3
        for bidder in 1..=5u8 {
            let ctx = app.ctx(addr(bidder));
            app.keeper
                .modify_bid(
                    &ctx,
                    id,
                    sequences[usize::from(bidder) - 1],
                    dec("2.0"),
                    Coin::new(SELL, 80),
                )
                .unwrap();
        }
        app.advance_to(round_two_end);
        let auction = app.keeper.get_auction(id).unwrap();
        assert_eq!(auction.status(), AuctionStatus::Started);
        assert_eq!(auction.base().end_times.len(), 3);
        assert_eq!(app.keeper.get_matched_bids_len(id), 5);

        // round 3: the matched set is stable, diff 0 < 0.3, settle
        app.advance_to(auction.base().end_time());
        let auction = app.keeper.get_auction(id).unwrap();
        assert_eq!(auction.status(), AuctionStatus::Vesting);
        assert_eq!(auction.batch_extras().unwrap().matched_price, dec("2.0"));

        for bidder in 1..=5u8 {
            assert_eq!(app.balance(addr(bidder), SELL), 80);
            // escrow grew to 160 on modify, all of it pays at 2.0
            assert_eq!(app.balance(addr(bidder), PAY), 40);
        }
        for bidder in 6..=10u8 {
            assert_eq!(app.balance(addr(bidder), SELL), 0);
            assert_eq!(app.balance(addr(bidder), PAY), 200);
        }
        assert_eq!(app.balance(addr(0), SELL), 600);
    }

    #[test]
    fn cancel_before_start() {
        let mut app = TestApp::new();
        app.fund(addr(0), Coin::new(SELL, 1_000));
        let ctx = app.ctx(addr(0));
        let id = app
            .keeper
            .create_fixed_price_auction(
                &ctx,
                dec("1.0"),
                Coin::new(SELL, 1_000),
                PAY.into(),
                vec![schedule(END + DAY, "1")],
                5_000,
                END,
            )
            .unwrap()
            .id();

        let auction = app.keeper.get_auction(id).unwrap();
        assert_eq!(auction.status(), AuctionStatus::StandBy);

        app.keeper.cancel_auction(&ctx, id).unwrap();

        let auction = app.keeper.get_auction(id).unwrap();
        assert_eq!(auction.status(), AuctionStatus::Cancelled);
        assert_eq!(auction.base().remaining_selling_coin.amount, 0);
        assert_eq!(app.balance(selling_reserve_address(id), SELL), 0);
        assert_eq!(app.balance(addr(0), SELL), 1_000);

        // the auction is terminal: nothing else is accepted
        let err = app
            .keeper
            .add_allowed_bidders(
                id,
                vec![AllowedBidder {
                    bidder: addr(1),
                    max_bid_amount: 100,
                }],
            )
            .unwrap_err();
        assert!(matches!(err, FundraisingError::InvalidAuctionStatus(_)));
        let bid_ctx = app.ctx(addr(1));
        let err = app
            .keeper
            .place_bid(&bid_ctx, id, BidType::FixedPrice, dec("1.0"), Coin::new(PAY, 10))
            .unwrap_err();
        assert!(matches!(err, FundraisingError::InvalidAuctionStatus(_)));

        // the sweep never resurrects it
        app.advance_to(END + 2 * DAY);
        assert_eq!(
            app.keeper.get_auction(id).unwrap().status(),
            AuctionStatus::Cancelled
        );
    }

    #[test]
    fn vesting_multi_tranche() {
        let mut app = TestApp::new();
        let id = create_fixed_price(
            &mut app,
            vec![schedule(END + DAY, "0.4"), schedule(END + 2 * DAY, "0.6")],
        );
        allow(&mut app, id, 1, 1_000);
        app.fund(addr(1), Coin::new(PAY, 1_000));

        app.advance_to(100);
        place_bid(&mut app, id, 1, BidType::FixedPrice, "1.0", Coin::new(PAY, 1_000));

        app.advance_to(END);
        let auction = app.keeper.get_auction(id).unwrap();
        assert_eq!(auction.status(), AuctionStatus::Vesting);
        assert_eq!(app.balance(auction.base().vesting_reserve_address, PAY), 1_000);

        let queues = app.keeper.get_vesting_queues_by_auction(id);
        assert_eq!(queues.len(), 2);
        assert_eq!(queues[0].paying_coin.amount, 400);
        assert_eq!(queues[1].paying_coin.amount, 600);

        app.advance_to(END + DAY);
        assert_eq!(app.balance(addr(0), PAY), 400);
        assert_eq!(
            app.keeper.get_auction(id).unwrap().status(),
            AuctionStatus::Vesting
        );
        assert!(app.keeper.get_vesting_queues_by_auction(id)[0].released);

        app.advance_to(END + 2 * DAY);
        assert_eq!(app.balance(addr(0), PAY), 1_000);
        assert_eq!(
            app.keeper.get_auction(id).unwrap().status(),
            AuctionStatus::Finished
        );
        assert!(app
            .keeper
            .get_vesting_queues_by_auction(id)
            .iter()
            .all(|queue| queue.released));
    }

    #[test]
    fn end_of_block_sweep_is_idempotent() {
        let mut app = TestApp::new();
        let id = create_fixed_price(&mut app, vec![schedule(END + DAY, "1")]);
        allow(&mut app, id, 1, 600);
        app.fund(addr(1), Coin::new(PAY, 500));
        app.advance_to(100);
        place_bid(&mut app, id, 1, BidType::FixedPrice, "1.0", Coin::new(PAY, 500));

        for time in [END, END + DAY] {
            app.advance_to(time);
            let snapshot = app.keeper.kv().dump().clone();
            let ctx = app.block_ctx();
            app.keeper.end_block(&ctx);
            assert_eq!(app.keeper.kv().dump(), &snapshot);
        }
    }

    #[test]
    fn replaying_the_block_log_is_deterministic() {
        let run = || {
            let mut app = TestApp::new();
            let id = create_batch(&mut app, 0, "0.3");
            for bidder in 1..=3 {
                allow(&mut app, id, bidder, 1_000);
            }
            app.fund(addr(1), Coin::new(PAY, 800));
            app.fund(addr(2), Coin::new(PAY, 750));
            app.advance_to(100);
            place_bid(&mut app, id, 1, BidType::BatchMany, "2.0", Coin::new(SELL, 400));
            place_bid(&mut app, id, 2, BidType::BatchWorth, "1.5", Coin::new(PAY, 750));
            app.advance_to(END);
            app.advance_to(1_000_000);
            app.keeper.kv().dump().clone()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn auction_ids_are_monotonic_across_kinds() {
        let mut app = TestApp::new();
        let first = create_fixed_price(&mut app, vec![schedule(END + DAY, "1")]);
        let second = create_batch(&mut app, 0, "0.3");
        let third = create_fixed_price(&mut app, vec![schedule(END + DAY, "1")]);
        assert_eq!((first, second, third), (1, 2, 3));

        // a rejected creation burns no id
        let ctx = app.ctx(addr(9));
        let err = app
            .keeper
            .create_fixed_price_auction(
                &ctx,
                dec("1.0"),
                Coin::new(SELL, 100),
                PAY.into(),
                vec![schedule(END + DAY, "1")],
                0,
                END,
            )
            .unwrap_err();
        assert!(matches!(err, FundraisingError::InsufficientFunds(_)));
        assert_eq!(app.keeper.get_last_auction_id(), 3);
    }
}
