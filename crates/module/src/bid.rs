//! Bid placement and modification.

use fundraising_types::{Auction, AuctionStatus, Bid, BidType, Coin, Dec};

use crate::error::FundraisingError;
use crate::event::{addr_hex, keys, types, Event};
use crate::host::{Bank, CallContext, EventSink, KvStore};
use crate::keeper::Keeper;

impl<K: KvStore, B: Bank, E: EventSink> Keeper<K, B, E> {
    /// Places a bid on a started auction, escrowing its paying coin into the
    /// paying reserve.
    ///
    /// The bidder's maximum bid amount is not checked here; clearing clamps
    /// every allocation to the cap, so oversized bids settle with a partial
    /// fill and a refund.
    pub fn place_bid(
        &mut self,
        ctx: &CallContext,
        auction_id: u64,
        bid_type: BidType,
        price: Dec,
        coin: Coin,
    ) -> Result<Bid, FundraisingError> {
        let auction = self
            .get_auction(auction_id)
            .ok_or_else(|| FundraisingError::NotFound(format!("auction {auction_id}")))?;
        let base = auction.base();

        if base.status != AuctionStatus::Started {
            return Err(FundraisingError::InvalidAuctionStatus(base.status));
        }
        if !base.allowed_bidders_map().contains_key(&ctx.sender) {
            return Err(FundraisingError::Unauthorized(format!(
                "{} is not an allowed bidder",
                addr_hex(&ctx.sender)
            )));
        }
        if coin.amount == 0 {
            return Err(FundraisingError::InvalidRequest(
                "bid coin amount must be positive".into(),
            ));
        }
        if !price.is_positive() {
            return Err(FundraisingError::InvalidRequest(
                "bid price must be positive".into(),
            ));
        }

        match (&auction, bid_type) {
            (Auction::FixedPrice(_), BidType::FixedPrice) => {
                if price != base.start_price {
                    return Err(FundraisingError::InvalidRequest(
                        "fixed price bids must be priced at the start price".into(),
                    ));
                }
                if coin.denom != base.paying_coin_denom && coin.denom != base.selling_coin.denom {
                    return Err(FundraisingError::InvalidRequest(
                        "bid coin denom must be the paying or the selling coin denom".into(),
                    ));
                }
            }
            (Auction::Batch(..), BidType::BatchWorth) => {
                if coin.denom != base.paying_coin_denom {
                    return Err(FundraisingError::InvalidRequest(
                        "worth bids must be denominated in the paying coin".into(),
                    ));
                }
            }
            (Auction::Batch(..), BidType::BatchMany) => {
                if coin.denom != base.selling_coin.denom {
                    return Err(FundraisingError::InvalidRequest(
                        "quantity bids must be denominated in the selling coin".into(),
                    ));
                }
            }
            _ => {
                return Err(FundraisingError::InvalidRequest(
                    "bid type does not match the auction type".into(),
                ));
            }
        }
        if let Some(extras) = auction.batch_extras() {
            if price < extras.min_bid_price {
                return Err(FundraisingError::InvalidRequest(
                    "bid price must be at least the minimum bid price".into(),
                ));
            }
        }

        let mut bid = Bid {
            auction_id,
            sequence: 0,
            bidder: ctx.sender,
            price,
            coin,
            bid_type,
            is_matched: false,
        };
        let paying_amount = bid
            .to_paying_amount(&base.paying_coin_denom)
            .ok_or_else(|| FundraisingError::InvalidRequest("paying amount overflow".into()))?;
        let paying_coin = Coin::new(base.paying_coin_denom.clone(), paying_amount);

        self.ensure_spendable(&ctx.sender, &[paying_coin.clone()])?;
        let paying_reserve = base.paying_reserve_address;
        self.reserve_paying_coin(&paying_reserve, &ctx.sender, &paying_coin)?;

        bid.sequence = self.next_bid_sequence_with_update(auction_id);
        self.set_bid(&bid);

        let event = Event::new(types::PLACE_BID)
            .attr(keys::AUCTION_ID, auction_id)
            .attr(keys::BIDDER, addr_hex(&bid.bidder))
            .attr(keys::BID_SEQUENCE, bid.sequence)
            .attr(keys::BID_PRICE, &bid.price)
            .attr(keys::BID_COIN, &bid.coin);
        self.events_mut().emit(event);

        Ok(bid)
    }

    /// Raises the price or amount of the bidder's own batch bid, escrowing
    /// the paying-coin difference. Neither may decrease and at least one
    /// must increase.
    pub fn modify_bid(
        &mut self,
        ctx: &CallContext,
        auction_id: u64,
        sequence: u64,
        price: Dec,
        coin: Coin,
    ) -> Result<Bid, FundraisingError> {
        let auction = self
            .get_auction(auction_id)
            .ok_or_else(|| FundraisingError::NotFound(format!("auction {auction_id}")))?;
        if !matches!(auction, Auction::Batch(..)) {
            return Err(FundraisingError::InvalidRequest(
                "only batch auction bids can be modified".into(),
            ));
        }
        let base = auction.base();
        if base.status != AuctionStatus::Started {
            return Err(FundraisingError::InvalidAuctionStatus(base.status));
        }

        let mut bid = self
            .get_bid(auction_id, sequence)
            .ok_or_else(|| FundraisingError::NotFound(format!("bid {sequence}")))?;
        if bid.bidder != ctx.sender {
            return Err(FundraisingError::Unauthorized(
                "only the bidder can modify the bid".into(),
            ));
        }
        if coin.denom != bid.coin.denom {
            return Err(FundraisingError::InvalidRequest(
                "bid coin denom cannot be changed".into(),
            ));
        }
        if price < bid.price || coin.amount < bid.coin.amount {
            return Err(FundraisingError::InvalidRequest(
                "bid price and amount cannot be lowered".into(),
            ));
        }
        if price == bid.price && coin.amount == bid.coin.amount {
            return Err(FundraisingError::InvalidRequest(
                "either the bid price or the bid amount must be raised".into(),
            ));
        }

        let old_paying = bid
            .to_paying_amount(&base.paying_coin_denom)
            .ok_or_else(|| FundraisingError::InvalidRequest("paying amount overflow".into()))?;
        bid.price = price;
        bid.coin = coin;
        let new_paying = bid
            .to_paying_amount(&base.paying_coin_denom)
            .ok_or_else(|| FundraisingError::InvalidRequest("paying amount overflow".into()))?;

        let difference = new_paying.saturating_sub(old_paying);
        if difference > 0 {
            let paying_coin = Coin::new(base.paying_coin_denom.clone(), difference);
            self.ensure_spendable(&ctx.sender, &[paying_coin.clone()])?;
            let paying_reserve = base.paying_reserve_address;
            self.reserve_paying_coin(&paying_reserve, &ctx.sender, &paying_coin)?;
        }
        self.set_bid(&bid);

        let event = Event::new(types::MODIFY_BID)
            .attr(keys::AUCTION_ID, auction_id)
            .attr(keys::BIDDER, addr_hex(&bid.bidder))
            .attr(keys::BID_SEQUENCE, bid.sequence)
            .attr(keys::BID_PRICE, &bid.price)
            .attr(keys::BID_COIN, &bid.coin);
        self.events_mut().emit(event);

        Ok(bid)
    }
}

#[cfg(test)]
mod tests {
    use fundraising_types::{AllowedBidder, VestingSchedule};

    use super::*;
    use crate::testing::{addr, TestApp};

    const SELL: &str = "denom1";
    const PAY: &str = "denom2";

    fn setup_batch(app: &mut TestApp) -> u64 {
        app.fund(addr(0), Coin::new(SELL, 1_000));
        let ctx = app.ctx(addr(0));
        let auction = app
            .keeper
            .create_batch_auction(
                &ctx,
                "1.0".parse().unwrap(),
                Coin::new(SELL, 1_000),
                PAY.into(),
                vec![VestingSchedule {
                    release_time: 100_000,
                    weight: Dec::one(),
                }],
                "0.5".parse().unwrap(),
                2,
                "0.2".parse().unwrap(),
                0,
                10_000,
            )
            .unwrap();
        let id = auction.id();
        app.keeper
            .add_allowed_bidders(
                id,
                vec![AllowedBidder {
                    bidder: addr(1),
                    max_bid_amount: 1_000,
                }],
            )
            .unwrap();
        id
    }

    #[test]
    fn test_place_bid_escrows_paying_coin() {
        let mut app = TestApp::new();
        let id = setup_batch(&mut app);
        app.fund(addr(1), Coin::new(PAY, 1_000));

        let ctx = app.ctx(addr(1));
        let bid = app
            .keeper
            .place_bid(
                &ctx,
                id,
                BidType::BatchMany,
                "1.5".parse().unwrap(),
                Coin::new(SELL, 400),
            )
            .unwrap();

        assert_eq!(bid.sequence, 1);
        // ceil(400 × 1.5) moved into the paying reserve
        assert_eq!(app.balance(addr(1), PAY), 400);
        let reserve = app.keeper.get_auction(id).unwrap().base().paying_reserve_address;
        assert_eq!(app.balance(reserve, PAY), 600);
    }

    #[test]
    fn test_place_bid_rejections() {
        let mut app = TestApp::new();
        let id = setup_batch(&mut app);
        app.fund(addr(1), Coin::new(PAY, 10_000));
        app.fund(addr(2), Coin::new(PAY, 10_000));

        // not an allowed bidder
        let ctx = app.ctx(addr(2));
        let err = app
            .keeper
            .place_bid(&ctx, id, BidType::BatchWorth, Dec::one(), Coin::new(PAY, 100))
            .unwrap_err();
        assert!(matches!(err, FundraisingError::Unauthorized(_)));

        let ctx = app.ctx(addr(1));
        // below the minimum bid price
        let err = app
            .keeper
            .place_bid(
                &ctx,
                id,
                BidType::BatchWorth,
                "0.4".parse().unwrap(),
                Coin::new(PAY, 100),
            )
            .unwrap_err();
        assert!(matches!(err, FundraisingError::InvalidRequest(_)));

        // wrong coin denom for the bid type
        let err = app
            .keeper
            .place_bid(&ctx, id, BidType::BatchWorth, Dec::one(), Coin::new(SELL, 100))
            .unwrap_err();
        assert!(matches!(err, FundraisingError::InvalidRequest(_)));

        // wrong bid type for the auction kind
        let err = app
            .keeper
            .place_bid(&ctx, id, BidType::FixedPrice, Dec::one(), Coin::new(PAY, 100))
            .unwrap_err();
        assert!(matches!(err, FundraisingError::InvalidRequest(_)));

        // unknown auction
        let err = app
            .keeper
            .place_bid(&ctx, 99, BidType::BatchWorth, Dec::one(), Coin::new(PAY, 100))
            .unwrap_err();
        assert!(matches!(err, FundraisingError::NotFound(_)));

        // insufficient funds
        let err = app
            .keeper
            .place_bid(
                &ctx,
                id,
                BidType::BatchWorth,
                Dec::one(),
                Coin::new(PAY, 100_000),
            )
            .unwrap_err();
        assert!(matches!(err, FundraisingError::InsufficientFunds(_)));
    }

    #[test]
    fn test_modify_bid_escrows_difference() {
        let mut app = TestApp::new();
        let id = setup_batch(&mut app);
        app.fund(addr(1), Coin::new(PAY, 1_000));

        let ctx = app.ctx(addr(1));
        let bid = app
            .keeper
            .place_bid(
                &ctx,
                id,
                BidType::BatchMany,
                "1.0".parse().unwrap(),
                Coin::new(SELL, 300),
            )
            .unwrap();
        assert_eq!(app.balance(addr(1), PAY), 700);

        // lowering is rejected
        let err = app
            .keeper
            .modify_bid(&ctx, id, bid.sequence, "0.9".parse().unwrap(), Coin::new(SELL, 300))
            .unwrap_err();
        assert!(matches!(err, FundraisingError::InvalidRequest(_)));

        // unchanged is rejected
        let err = app
            .keeper
            .modify_bid(&ctx, id, bid.sequence, "1.0".parse().unwrap(), Coin::new(SELL, 300))
            .unwrap_err();
        assert!(matches!(err, FundraisingError::InvalidRequest(_)));

        // raising the price escrows the difference: 300 × 1.5 − 300 × 1.0
        let modified = app
            .keeper
            .modify_bid(&ctx, id, bid.sequence, "1.5".parse().unwrap(), Coin::new(SELL, 300))
            .unwrap();
        assert_eq!(modified.sequence, bid.sequence);
        assert_eq!(app.balance(addr(1), PAY), 550);

        // only the bidder can modify
        let other = app.ctx(addr(2));
        let err = app
            .keeper
            .modify_bid(&other, id, bid.sequence, "2.0".parse().unwrap(), Coin::new(SELL, 300))
            .unwrap_err();
        assert!(matches!(err, FundraisingError::Unauthorized(_)));
    }
}
