//! Mock chain server for local driving of the fundraising engine.
//!
//! Provides a JSON-RPC server that simulates the host ledger — block clock,
//! bank, key-value store, and event stream — without requiring a real
//! blockchain. Blocks advance on request and run the end-of-block sweep,
//! which is where every time-driven transition happens.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use jsonrpsee::core::async_trait;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::Server;
use jsonrpsee::types::ErrorObjectOwned;
use parking_lot::RwLock;
use tracing::info;

use fundraising_module::memory::{MemBank, MemEvents, MemKv};
use fundraising_module::{Bank, BlockContext, CallContext, FundraisingError, Keeper};
use fundraising_types::{Address, AllowedBidder, BidType, Coin, Dec, VestingSchedule};

mod types;
use types::*;

/// Seconds between blocks.
const BLOCK_SECS: u64 = 12;

/// Shared chain state.
struct ChainState {
    keeper: Keeper<MemKv, MemBank, MemEvents>,
    height: u64,
    timestamp: u64,
}

impl ChainState {
    fn new() -> Self {
        Self {
            keeper: Keeper::new(MemKv::new(), MemBank::new(), MemEvents::new()),
            height: 1,
            timestamp: 0,
        }
    }

    fn advance_block(&mut self) {
        self.height += 1;
        self.timestamp += BLOCK_SECS;
        let ctx = BlockContext {
            height: self.height,
            block_time: self.timestamp,
        };
        self.keeper.end_block(&ctx);
    }

    fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    fn call_context(&self, sender: Address) -> CallContext {
        CallContext {
            sender,
            height: self.height,
            block_time: self.timestamp,
        }
    }
}

/// RPC API definition for the mock chain.
#[rpc(server)]
pub trait MockChainApi {
    // ============ Admin Methods ============

    /// Advance the chain by one block, running the end-of-block sweep.
    #[method(name = "admin_advanceBlock")]
    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Set the current timestamp (for testing time-dependent logic). Takes
    /// effect from the next block.
    #[method(name = "admin_setTimestamp")]
    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<bool, ErrorObjectOwned>;

    /// Credit an account with coins.
    #[method(name = "admin_fundAccount")]
    async fn admin_fund_account(
        &self,
        address: String,
        coin: CoinRpc,
    ) -> Result<bool, ErrorObjectOwned>;

    // ============ Transaction Methods ============

    /// Create a fixed-price auction.
    #[method(name = "tx_createFixedPriceAuction")]
    async fn tx_create_fixed_price_auction(
        &self,
        params: CreateFixedPriceAuctionParams,
    ) -> Result<u64, ErrorObjectOwned>;

    /// Create a batch auction.
    #[method(name = "tx_createBatchAuction")]
    async fn tx_create_batch_auction(
        &self,
        params: CreateBatchAuctionParams,
    ) -> Result<u64, ErrorObjectOwned>;

    /// Cancel a stand-by auction.
    #[method(name = "tx_cancelAuction")]
    async fn tx_cancel_auction(
        &self,
        sender: String,
        auction_id: u64,
    ) -> Result<bool, ErrorObjectOwned>;

    /// Register allowed bidders (authorization-module surface).
    #[method(name = "tx_addAllowedBidders")]
    async fn tx_add_allowed_bidders(
        &self,
        auction_id: u64,
        bidders: Vec<AllowedBidderRpc>,
    ) -> Result<bool, ErrorObjectOwned>;

    /// Update an allowed bidder's maximum bid amount.
    #[method(name = "tx_updateAllowedBidder")]
    async fn tx_update_allowed_bidder(
        &self,
        auction_id: u64,
        bidder: String,
        max_bid_amount: String,
    ) -> Result<bool, ErrorObjectOwned>;

    /// Place a bid.
    #[method(name = "tx_placeBid")]
    async fn tx_place_bid(&self, params: PlaceBidParams) -> Result<u64, ErrorObjectOwned>;

    /// Modify a batch bid.
    #[method(name = "tx_modifyBid")]
    async fn tx_modify_bid(&self, params: ModifyBidParams) -> Result<bool, ErrorObjectOwned>;

    // ============ Query Methods ============

    /// Get current block info.
    #[method(name = "chain_getBlockInfo")]
    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Get auction by id.
    #[method(name = "query_getAuction")]
    async fn query_get_auction(
        &self,
        auction_id: u64,
    ) -> Result<Option<AuctionRpc>, ErrorObjectOwned>;

    /// List all auctions.
    #[method(name = "query_listAuctions")]
    async fn query_list_auctions(&self) -> Result<Vec<AuctionRpc>, ErrorObjectOwned>;

    /// Get all bids for an auction, in sequence order.
    #[method(name = "query_getBids")]
    async fn query_get_bids(&self, auction_id: u64) -> Result<Vec<BidRpc>, ErrorObjectOwned>;

    /// Get the vesting queue of an auction, in release-time order.
    #[method(name = "query_getVestingQueues")]
    async fn query_get_vesting_queues(
        &self,
        auction_id: u64,
    ) -> Result<Vec<VestingQueueRpc>, ErrorObjectOwned>;

    /// Get an account's spendable balance of a denom.
    #[method(name = "query_getBalance")]
    async fn query_get_balance(
        &self,
        address: String,
        denom: String,
    ) -> Result<String, ErrorObjectOwned>;

    /// Drain and return all events emitted since the last call.
    #[method(name = "query_takeEvents")]
    async fn query_take_events(&self) -> Result<Vec<EventRpc>, ErrorObjectOwned>;
}

/// Implementation of the mock chain RPC server.
struct MockChainServer {
    state: Arc<RwLock<ChainState>>,
}

impl MockChainServer {
    fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ChainState::new())),
        }
    }

    fn rpc_error(msg: &str) -> ErrorObjectOwned {
        ErrorObjectOwned::owned(-32000, msg.to_string(), None::<()>)
    }

    fn call_error(err: FundraisingError) -> ErrorObjectOwned {
        ErrorObjectOwned::owned(err.code() as i32, err.to_string(), None::<()>)
    }
}

fn parse_address(s: &str) -> Result<Address, ErrorObjectOwned> {
    let bytes = hex::decode(s.trim_start_matches("0x"))
        .map_err(|err| MockChainServer::rpc_error(&format!("invalid address hex: {err}")))?;
    bytes
        .try_into()
        .map_err(|_| MockChainServer::rpc_error("address must be 32 bytes"))
}

fn parse_dec(s: &str, what: &str) -> Result<Dec, ErrorObjectOwned> {
    s.parse()
        .map_err(|_| MockChainServer::rpc_error(&format!("invalid {what}: {s}")))
}

fn parse_amount(s: &str, what: &str) -> Result<u128, ErrorObjectOwned> {
    s.parse()
        .map_err(|_| MockChainServer::rpc_error(&format!("invalid {what}: {s}")))
}

fn parse_coin(coin: &CoinRpc) -> Result<Coin, ErrorObjectOwned> {
    Ok(Coin::new(
        coin.denom.clone(),
        parse_amount(&coin.amount, "coin amount")?,
    ))
}

fn parse_schedules(
    schedules: &[VestingScheduleRpc],
) -> Result<Vec<VestingSchedule>, ErrorObjectOwned> {
    schedules
        .iter()
        .map(|s| {
            Ok(VestingSchedule {
                release_time: s.release_time,
                weight: parse_dec(&s.weight, "vesting weight")?,
            })
        })
        .collect()
}

fn parse_bid_type(s: &str) -> Result<BidType, ErrorObjectOwned> {
    match s {
        "fixed_price" => Ok(BidType::FixedPrice),
        "batch_worth" => Ok(BidType::BatchWorth),
        "batch_many" => Ok(BidType::BatchMany),
        _ => Err(MockChainServer::rpc_error("invalid bid type")),
    }
}

#[async_trait]
impl MockChainApiServer for MockChainServer {
    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        let mut state = self.state.write();
        state.advance_block();
        Ok(BlockInfo {
            height: state.height,
            timestamp: state.timestamp,
        })
    }

    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<bool, ErrorObjectOwned> {
        let mut state = self.state.write();
        state.set_timestamp(timestamp);
        info!("timestamp set to {}", timestamp);
        Ok(true)
    }

    async fn admin_fund_account(
        &self,
        address: String,
        coin: CoinRpc,
    ) -> Result<bool, ErrorObjectOwned> {
        let addr = parse_address(&address)?;
        let coin = parse_coin(&coin)?;
        let mut state = self.state.write();
        state.keeper.bank_mut().mint(&addr, &coin);
        Ok(true)
    }

    async fn tx_create_fixed_price_auction(
        &self,
        params: CreateFixedPriceAuctionParams,
    ) -> Result<u64, ErrorObjectOwned> {
        let sender = parse_address(&params.sender)?;
        let start_price = parse_dec(&params.start_price, "start price")?;
        let selling_coin = parse_coin(&params.selling_coin)?;
        let schedules = parse_schedules(&params.vesting_schedules)?;

        let mut state = self.state.write();
        let ctx = state.call_context(sender);
        let auction = state
            .keeper
            .create_fixed_price_auction(
                &ctx,
                start_price,
                selling_coin,
                params.paying_coin_denom,
                schedules,
                params.start_time,
                params.end_time,
            )
            .map_err(Self::call_error)?;

        info!("created fixed price auction {}", auction.id());
        Ok(auction.id())
    }

    async fn tx_create_batch_auction(
        &self,
        params: CreateBatchAuctionParams,
    ) -> Result<u64, ErrorObjectOwned> {
        let sender = parse_address(&params.sender)?;
        let start_price = parse_dec(&params.start_price, "start price")?;
        let selling_coin = parse_coin(&params.selling_coin)?;
        let schedules = parse_schedules(&params.vesting_schedules)?;
        let min_bid_price = parse_dec(&params.min_bid_price, "minimum bid price")?;
        let extended_round_rate = parse_dec(&params.extended_round_rate, "extended round rate")?;

        let mut state = self.state.write();
        let ctx = state.call_context(sender);
        let auction = state
            .keeper
            .create_batch_auction(
                &ctx,
                start_price,
                selling_coin,
                params.paying_coin_denom,
                schedules,
                min_bid_price,
                params.max_extended_round,
                extended_round_rate,
                params.start_time,
                params.end_time,
            )
            .map_err(Self::call_error)?;

        info!("created batch auction {}", auction.id());
        Ok(auction.id())
    }

    async fn tx_cancel_auction(
        &self,
        sender: String,
        auction_id: u64,
    ) -> Result<bool, ErrorObjectOwned> {
        let sender = parse_address(&sender)?;
        let mut state = self.state.write();
        let ctx = state.call_context(sender);
        state
            .keeper
            .cancel_auction(&ctx, auction_id)
            .map_err(Self::call_error)?;
        info!("cancelled auction {}", auction_id);
        Ok(true)
    }

    async fn tx_add_allowed_bidders(
        &self,
        auction_id: u64,
        bidders: Vec<AllowedBidderRpc>,
    ) -> Result<bool, ErrorObjectOwned> {
        let bidders = bidders
            .iter()
            .map(|ab| {
                Ok(AllowedBidder {
                    bidder: parse_address(&ab.bidder)?,
                    max_bid_amount: parse_amount(&ab.max_bid_amount, "maximum bid amount")?,
                })
            })
            .collect::<Result<Vec<_>, ErrorObjectOwned>>()?;

        let mut state = self.state.write();
        state
            .keeper
            .add_allowed_bidders(auction_id, bidders)
            .map_err(Self::call_error)?;
        Ok(true)
    }

    async fn tx_update_allowed_bidder(
        &self,
        auction_id: u64,
        bidder: String,
        max_bid_amount: String,
    ) -> Result<bool, ErrorObjectOwned> {
        let bidder = parse_address(&bidder)?;
        let max_bid_amount = parse_amount(&max_bid_amount, "maximum bid amount")?;
        let mut state = self.state.write();
        state
            .keeper
            .update_allowed_bidder(auction_id, bidder, max_bid_amount)
            .map_err(Self::call_error)?;
        Ok(true)
    }

    async fn tx_place_bid(&self, params: PlaceBidParams) -> Result<u64, ErrorObjectOwned> {
        let sender = parse_address(&params.sender)?;
        let bid_type = parse_bid_type(&params.bid_type)?;
        let price = parse_dec(&params.price, "bid price")?;
        let coin = parse_coin(&params.coin)?;

        let mut state = self.state.write();
        let ctx = state.call_context(sender);
        let bid = state
            .keeper
            .place_bid(&ctx, params.auction_id, bid_type, price, coin)
            .map_err(Self::call_error)?;

        info!(
            "bid {} placed on auction {} by {}",
            bid.sequence, params.auction_id, params.sender
        );
        Ok(bid.sequence)
    }

    async fn tx_modify_bid(&self, params: ModifyBidParams) -> Result<bool, ErrorObjectOwned> {
        let sender = parse_address(&params.sender)?;
        let price = parse_dec(&params.price, "bid price")?;
        let coin = parse_coin(&params.coin)?;

        let mut state = self.state.write();
        let ctx = state.call_context(sender);
        state
            .keeper
            .modify_bid(&ctx, params.auction_id, params.sequence, price, coin)
            .map_err(Self::call_error)?;
        Ok(true)
    }

    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(BlockInfo {
            height: state.height,
            timestamp: state.timestamp,
        })
    }

    async fn query_get_auction(
        &self,
        auction_id: u64,
    ) -> Result<Option<AuctionRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state
            .keeper
            .get_auction(auction_id)
            .as_ref()
            .map(AuctionRpc::from))
    }

    async fn query_list_auctions(&self) -> Result<Vec<AuctionRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state
            .keeper
            .iter_auctions()
            .iter()
            .map(AuctionRpc::from)
            .collect())
    }

    async fn query_get_bids(&self, auction_id: u64) -> Result<Vec<BidRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state
            .keeper
            .get_bids_by_auction(auction_id)
            .iter()
            .map(BidRpc::from)
            .collect())
    }

    async fn query_get_vesting_queues(
        &self,
        auction_id: u64,
    ) -> Result<Vec<VestingQueueRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state
            .keeper
            .get_vesting_queues_by_auction(auction_id)
            .iter()
            .map(VestingQueueRpc::from)
            .collect())
    }

    async fn query_get_balance(
        &self,
        address: String,
        denom: String,
    ) -> Result<String, ErrorObjectOwned> {
        let addr = parse_address(&address)?;
        let state = self.state.read();
        Ok(state.keeper.bank().spendable(&addr, &denom).to_string())
    }

    async fn query_take_events(&self) -> Result<Vec<EventRpc>, ErrorObjectOwned> {
        let mut state = self.state.write();
        let events = state.keeper.events_mut().take();
        Ok(events.iter().map(EventRpc::from).collect())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mock_chain=info".parse()?)
                .add_directive("fundraising_module=info".parse()?)
                .add_directive("jsonrpsee=warn".parse()?),
        )
        .init();

    let addr: SocketAddr = "127.0.0.1:9944".parse()?;

    info!("starting mock chain server on {}", addr);

    let server = Server::builder().build(addr).await?;
    let handle = server.start(MockChainServer::new().into_rpc());

    info!("mock chain server running, press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;

    info!("shutting down");
    handle.stop()?;
    handle.stopped().await;

    Ok(())
}
