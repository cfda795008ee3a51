//! Persisted state layout and access.
//!
//! A flat byte-keyed namespace with prefixed keys. Numeric key components
//! are big-endian so that prefix iteration yields records in id, sequence,
//! and release-time order.

use borsh::{BorshDeserialize, BorshSerialize};

use fundraising_types::{Auction, Bid, VestingQueue};

use crate::host::{Bank, EventSink, KvStore};
use crate::keeper::Keeper;
use crate::params::Params;

pub(crate) mod keys {
    pub const LAST_ID: &[u8] = b"last_id";
    pub const PARAMS: &[u8] = b"params";

    pub const AUCTION_PREFIX: &[u8] = b"auction/";

    pub fn auction(id: u64) -> Vec<u8> {
        [AUCTION_PREFIX, id.to_be_bytes().as_slice()].concat()
    }

    pub fn bid_prefix(auction_id: u64) -> Vec<u8> {
        [
            b"bid/".as_slice(),
            auction_id.to_be_bytes().as_slice(),
            b"/".as_slice(),
        ]
        .concat()
    }

    pub fn bid(auction_id: u64, sequence: u64) -> Vec<u8> {
        [
            bid_prefix(auction_id).as_slice(),
            sequence.to_be_bytes().as_slice(),
        ]
        .concat()
    }

    pub fn bid_seq(auction_id: u64) -> Vec<u8> {
        [b"bid_seq/".as_slice(), auction_id.to_be_bytes().as_slice()].concat()
    }

    pub fn vesting_prefix(auction_id: u64) -> Vec<u8> {
        [
            b"vesting/".as_slice(),
            auction_id.to_be_bytes().as_slice(),
            b"/".as_slice(),
        ]
        .concat()
    }

    pub fn vesting(auction_id: u64, release_time: u64) -> Vec<u8> {
        [
            vesting_prefix(auction_id).as_slice(),
            release_time.to_be_bytes().as_slice(),
        ]
        .concat()
    }

    pub fn matched_len(auction_id: u64) -> Vec<u8> {
        [
            b"matched_len/".as_slice(),
            auction_id.to_be_bytes().as_slice(),
        ]
        .concat()
    }
}

fn encode<T: BorshSerialize>(value: &T) -> Vec<u8> {
    borsh::to_vec(value).unwrap_or_else(|err| panic!("failed to encode record: {err}"))
}

fn decode<T: BorshDeserialize>(bytes: &[u8], what: &str) -> T {
    borsh::from_slice(bytes).unwrap_or_else(|err| panic!("corrupt {what} record: {err}"))
}

impl<K: KvStore, B: Bank, E: EventSink> Keeper<K, B, E> {
    pub fn get_params(&self) -> Params {
        self.kv()
            .get(keys::PARAMS)
            .map(|bytes| decode(&bytes, "params"))
            .unwrap_or_default()
    }

    pub fn set_params(&mut self, params: &Params) {
        let bytes = encode(params);
        self.kv_mut().set(keys::PARAMS, bytes);
    }

    pub fn get_last_auction_id(&self) -> u64 {
        self.kv()
            .get(keys::LAST_ID)
            .map(|bytes| decode(&bytes, "last auction id"))
            .unwrap_or(0)
    }

    /// Increments the auction id counter, persists it, and returns the new
    /// id. Ids start at 1 and are never reused.
    pub fn next_auction_id_with_update(&mut self) -> u64 {
        let id = self.get_last_auction_id() + 1;
        self.kv_mut().set(keys::LAST_ID, encode(&id));
        id
    }

    pub fn get_auction(&self, id: u64) -> Option<Auction> {
        self.kv()
            .get(&keys::auction(id))
            .map(|bytes| decode(&bytes, "auction"))
    }

    pub fn set_auction(&mut self, auction: &Auction) {
        let bytes = encode(auction);
        self.kv_mut().set(&keys::auction(auction.id()), bytes);
    }

    /// All auctions in ascending id order.
    pub fn iter_auctions(&self) -> Vec<Auction> {
        self.kv()
            .iter_prefix(keys::AUCTION_PREFIX)
            .iter()
            .map(|(_, bytes)| decode(bytes, "auction"))
            .collect()
    }

    /// Increments the per-auction bid sequence, persists it, and returns the
    /// new sequence. Sequences start at 1.
    pub fn next_bid_sequence_with_update(&mut self, auction_id: u64) -> u64 {
        let key = keys::bid_seq(auction_id);
        let seq: u64 = self
            .kv()
            .get(&key)
            .map(|bytes| decode(&bytes, "bid sequence"))
            .unwrap_or(0)
            + 1;
        self.kv_mut().set(&key, encode(&seq));
        seq
    }

    pub fn get_bid(&self, auction_id: u64, sequence: u64) -> Option<Bid> {
        self.kv()
            .get(&keys::bid(auction_id, sequence))
            .map(|bytes| decode(&bytes, "bid"))
    }

    pub fn set_bid(&mut self, bid: &Bid) {
        let bytes = encode(bid);
        self.kv_mut().set(&keys::bid(bid.auction_id, bid.sequence), bytes);
    }

    /// All bids of an auction in ascending sequence order.
    pub fn get_bids_by_auction(&self, auction_id: u64) -> Vec<Bid> {
        self.kv()
            .iter_prefix(&keys::bid_prefix(auction_id))
            .iter()
            .map(|(_, bytes)| decode(bytes, "bid"))
            .collect()
    }

    pub fn set_vesting_queue(&mut self, queue: &VestingQueue) {
        let bytes = encode(queue);
        self.kv_mut()
            .set(&keys::vesting(queue.auction_id, queue.release_time), bytes);
    }

    /// All vesting queue entries of an auction in ascending release-time
    /// order.
    pub fn get_vesting_queues_by_auction(&self, auction_id: u64) -> Vec<VestingQueue> {
        self.kv()
            .iter_prefix(&keys::vesting_prefix(auction_id))
            .iter()
            .map(|(_, bytes)| decode(bytes, "vesting queue"))
            .collect()
    }

    /// Matched-bid count persisted by the latest batch clearing; zero before
    /// the first pass.
    pub fn get_matched_bids_len(&self, auction_id: u64) -> u64 {
        self.kv()
            .get(&keys::matched_len(auction_id))
            .map(|bytes| decode(&bytes, "matched bids len"))
            .unwrap_or(0)
    }

    pub fn set_matched_bids_len(&mut self, auction_id: u64, len: u64) {
        let bytes = encode(&len);
        self.kv_mut().set(&keys::matched_len(auction_id), bytes);
    }
}
