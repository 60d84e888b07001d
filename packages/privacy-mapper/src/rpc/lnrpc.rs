// packages/privacy-mapper/src/rpc/lnrpc.rs
//! Messages of lnd's `lightning.proto` touched by the privacy mapper
//!
//! Tags match the upstream definitions so messages decode from and encode to
//! the same bytes lnd produces. Every field lnd declares for these messages is
//! declared here too, so a rewritten message keeps the fields no handler
//! touches. Top-level fields newer than these declarations are carried over
//! by `RpcMessage::encode_replacement`.

use crate::utils::errors::{MapperError, Result};
use std::collections::HashMap;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetInfoRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetInfoResponse {
    #[prost(string, tag = "14")]
    pub version: String,
    #[prost(string, tag = "20")]
    pub commit_hash: String,
    #[prost(string, tag = "1")]
    pub identity_pubkey: String,
    #[prost(string, tag = "2")]
    pub alias: String,
    #[prost(string, tag = "17")]
    pub color: String,
    #[prost(uint32, tag = "3")]
    pub num_pending_channels: u32,
    #[prost(uint32, tag = "4")]
    pub num_active_channels: u32,
    #[prost(uint32, tag = "15")]
    pub num_inactive_channels: u32,
    #[prost(uint32, tag = "5")]
    pub num_peers: u32,
    #[prost(uint32, tag = "6")]
    pub block_height: u32,
    #[prost(string, tag = "8")]
    pub block_hash: String,
    #[prost(int64, tag = "13")]
    pub best_header_timestamp: i64,
    #[prost(bool, tag = "9")]
    pub synced_to_chain: bool,
    #[prost(bool, tag = "18")]
    pub synced_to_graph: bool,
    /// Deprecated upstream, still populated by older nodes
    #[prost(bool, tag = "10")]
    pub testnet: bool,
    #[prost(message, repeated, tag = "16")]
    pub chains: Vec<Chain>,
    #[prost(string, repeated, tag = "12")]
    pub uris: Vec<String>,
    #[prost(map = "uint32, message", tag = "19")]
    pub features: HashMap<u32, Feature>,
    #[prost(bool, tag = "21")]
    pub require_htlc_interceptor: bool,
    #[prost(bool, tag = "22")]
    pub store_final_htlc_resolutions: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Chain {
    #[prost(string, tag = "1")]
    pub chain: String,
    #[prost(string, tag = "2")]
    pub network: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Feature {
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(bool, tag = "3")]
    pub is_required: bool,
    #[prost(bool, tag = "4")]
    pub is_known: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ForwardingHistoryRequest {
    #[prost(uint64, tag = "1")]
    pub start_time: u64,
    #[prost(uint64, tag = "2")]
    pub end_time: u64,
    #[prost(uint32, tag = "3")]
    pub index_offset: u32,
    #[prost(uint32, tag = "4")]
    pub num_max_events: u32,
    #[prost(bool, tag = "5")]
    pub peer_alias_lookup: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ForwardingEvent {
    /// Seconds since epoch
    #[prost(uint64, tag = "1")]
    pub timestamp: u64,
    #[prost(uint64, tag = "2")]
    pub chan_id_in: u64,
    #[prost(uint64, tag = "4")]
    pub chan_id_out: u64,
    #[prost(uint64, tag = "5")]
    pub amt_in: u64,
    #[prost(uint64, tag = "6")]
    pub amt_out: u64,
    #[prost(uint64, tag = "7")]
    pub fee: u64,
    #[prost(uint64, tag = "8")]
    pub fee_msat: u64,
    #[prost(uint64, tag = "9")]
    pub amt_in_msat: u64,
    #[prost(uint64, tag = "10")]
    pub amt_out_msat: u64,
    /// Nanoseconds since epoch
    #[prost(uint64, tag = "11")]
    pub timestamp_ns: u64,
    #[prost(string, tag = "12")]
    pub peer_alias_in: String,
    #[prost(string, tag = "13")]
    pub peer_alias_out: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ForwardingHistoryResponse {
    #[prost(message, repeated, tag = "1")]
    pub forwarding_events: Vec<ForwardingEvent>,
    #[prost(uint32, tag = "2")]
    pub last_offset_index: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FeeReportRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChannelFeeReport {
    #[prost(uint64, tag = "5")]
    pub chan_id: u64,
    #[prost(string, tag = "1")]
    pub channel_point: String,
    #[prost(int64, tag = "2")]
    pub base_fee_msat: i64,
    #[prost(int64, tag = "3")]
    pub fee_per_mil: i64,
    #[prost(double, tag = "4")]
    pub fee_rate: f64,
    #[prost(int32, tag = "6")]
    pub inbound_base_fee_msat: i32,
    #[prost(int32, tag = "7")]
    pub inbound_fee_per_mil: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FeeReportResponse {
    #[prost(message, repeated, tag = "1")]
    pub channel_fees: Vec<ChannelFeeReport>,
    #[prost(uint64, tag = "2")]
    pub day_fee_sum: u64,
    #[prost(uint64, tag = "3")]
    pub week_fee_sum: u64,
    #[prost(uint64, tag = "4")]
    pub month_fee_sum: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListChannelsRequest {
    #[prost(bool, tag = "1")]
    pub active_only: bool,
    #[prost(bool, tag = "2")]
    pub inactive_only: bool,
    #[prost(bool, tag = "3")]
    pub public_only: bool,
    #[prost(bool, tag = "4")]
    pub private_only: bool,
    /// Serialized pubkey of the peer to filter by
    #[prost(bytes = "vec", tag = "5")]
    pub peer: Vec<u8>,
    #[prost(bool, tag = "6")]
    pub peer_alias_lookup: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Htlc {
    #[prost(bool, tag = "1")]
    pub incoming: bool,
    #[prost(int64, tag = "2")]
    pub amount: i64,
    #[prost(bytes = "vec", tag = "3")]
    pub hash_lock: Vec<u8>,
    #[prost(uint32, tag = "4")]
    pub expiration_height: u32,
    #[prost(uint64, tag = "5")]
    pub htlc_index: u64,
    #[prost(uint64, tag = "6")]
    pub forwarding_channel: u64,
    #[prost(uint64, tag = "7")]
    pub forwarding_htlc_index: u64,
    #[prost(bool, tag = "8")]
    pub locked_in: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum CommitmentType {
    UnknownCommitmentType = 0,
    Legacy = 1,
    StaticRemoteKey = 2,
    Anchors = 3,
    ScriptEnforcedLease = 4,
    SimpleTaproot = 5,
    SimpleTaprootOverlay = 6,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChannelConstraints {
    #[prost(uint32, tag = "1")]
    pub csv_delay: u32,
    #[prost(uint64, tag = "2")]
    pub chan_reserve_sat: u64,
    #[prost(uint64, tag = "3")]
    pub dust_limit_sat: u64,
    #[prost(uint64, tag = "4")]
    pub max_pending_amt_msat: u64,
    #[prost(uint64, tag = "5")]
    pub min_htlc_msat: u64,
    #[prost(uint32, tag = "6")]
    pub max_accepted_htlcs: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Channel {
    #[prost(bool, tag = "1")]
    pub active: bool,
    #[prost(string, tag = "2")]
    pub remote_pubkey: String,
    #[prost(string, tag = "3")]
    pub channel_point: String,
    #[prost(uint64, tag = "4")]
    pub chan_id: u64,
    #[prost(int64, tag = "5")]
    pub capacity: i64,
    #[prost(int64, tag = "6")]
    pub local_balance: i64,
    #[prost(int64, tag = "7")]
    pub remote_balance: i64,
    #[prost(int64, tag = "8")]
    pub commit_fee: i64,
    #[prost(int64, tag = "9")]
    pub commit_weight: i64,
    #[prost(int64, tag = "10")]
    pub fee_per_kw: i64,
    #[prost(int64, tag = "11")]
    pub unsettled_balance: i64,
    #[prost(int64, tag = "12")]
    pub total_satoshis_sent: i64,
    #[prost(int64, tag = "13")]
    pub total_satoshis_received: i64,
    #[prost(uint64, tag = "14")]
    pub num_updates: u64,
    #[prost(message, repeated, tag = "15")]
    pub pending_htlcs: Vec<Htlc>,
    /// Deprecated upstream in favour of `local_constraints`
    #[prost(uint32, tag = "16")]
    pub csv_delay: u32,
    #[prost(bool, tag = "17")]
    pub private: bool,
    #[prost(bool, tag = "18")]
    pub initiator: bool,
    #[prost(string, tag = "19")]
    pub chan_status_flags: String,
    #[prost(int64, tag = "20")]
    pub local_chan_reserve_sat: i64,
    #[prost(int64, tag = "21")]
    pub remote_chan_reserve_sat: i64,
    #[prost(bool, tag = "22")]
    pub static_remote_key: bool,
    #[prost(enumeration = "CommitmentType", tag = "26")]
    pub commitment_type: i32,
    #[prost(int64, tag = "23")]
    pub lifetime: i64,
    #[prost(int64, tag = "24")]
    pub uptime: i64,
    #[prost(string, tag = "25")]
    pub close_address: String,
    #[prost(uint64, tag = "27")]
    pub push_amount_sat: u64,
    #[prost(uint32, tag = "28")]
    pub thaw_height: u32,
    #[prost(message, optional, tag = "29")]
    pub local_constraints: Option<ChannelConstraints>,
    #[prost(message, optional, tag = "30")]
    pub remote_constraints: Option<ChannelConstraints>,
    #[prost(uint64, repeated, tag = "31")]
    pub alias_scids: Vec<u64>,
    #[prost(bool, tag = "32")]
    pub zero_conf: bool,
    #[prost(uint64, tag = "33")]
    pub zero_conf_confirmed_scid: u64,
    #[prost(string, tag = "34")]
    pub peer_alias: String,
    #[prost(uint64, tag = "35")]
    pub peer_scid_alias: u64,
    #[prost(string, tag = "36")]
    pub memo: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListChannelsResponse {
    #[prost(message, repeated, tag = "11")]
    pub channels: Vec<Channel>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChannelPoint {
    #[prost(oneof = "channel_point::FundingTxid", tags = "1, 2")]
    pub funding_txid: Option<channel_point::FundingTxid>,
    #[prost(uint32, tag = "3")]
    pub output_index: u32,
}

pub mod channel_point {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum FundingTxid {
        /// Txid in internal (little-endian) byte order
        #[prost(bytes, tag = "1")]
        FundingTxidBytes(Vec<u8>),
        /// Txid as displayed (big-endian hex)
        #[prost(string, tag = "2")]
        FundingTxidStr(String),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OutPoint {
    #[prost(bytes = "vec", tag = "1")]
    pub txid_bytes: Vec<u8>,
    #[prost(string, tag = "2")]
    pub txid_str: String,
    #[prost(uint32, tag = "3")]
    pub output_index: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PolicyUpdateRequest {
    #[prost(oneof = "policy_update_request::Scope", tags = "1, 2")]
    pub scope: Option<policy_update_request::Scope>,
    #[prost(int64, tag = "3")]
    pub base_fee_msat: i64,
    #[prost(double, tag = "4")]
    pub fee_rate: f64,
    #[prost(uint32, tag = "5")]
    pub time_lock_delta: u32,
    #[prost(uint64, tag = "6")]
    pub max_htlc_msat: u64,
    #[prost(uint64, tag = "7")]
    pub min_htlc_msat: u64,
    #[prost(bool, tag = "8")]
    pub min_htlc_msat_specified: bool,
    #[prost(uint32, tag = "9")]
    pub fee_rate_ppm: u32,
    #[prost(message, optional, tag = "10")]
    pub inbound_fee: Option<InboundFee>,
    #[prost(bool, tag = "11")]
    pub create_missing_edge: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InboundFee {
    #[prost(int32, tag = "1")]
    pub base_fee_msat: i32,
    #[prost(int32, tag = "2")]
    pub fee_rate_ppm: i32,
}

pub mod policy_update_request {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Scope {
        #[prost(bool, tag = "1")]
        Global(bool),
        #[prost(message, tag = "2")]
        ChanPoint(super::ChannelPoint),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum UpdateFailure {
    Unknown = 0,
    Pending = 1,
    NotFound = 2,
    InternalErr = 3,
    InvalidParameter = 4,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FailedUpdate {
    #[prost(message, optional, tag = "1")]
    pub outpoint: Option<OutPoint>,
    #[prost(enumeration = "UpdateFailure", tag = "2")]
    pub reason: i32,
    #[prost(string, tag = "3")]
    pub update_error: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PolicyUpdateResponse {
    #[prost(message, repeated, tag = "1")]
    pub failed_updates: Vec<FailedUpdate>,
}

/// Length of a transaction hash in bytes
pub const TXID_LEN: usize = 32;

/// Display form of a txid given in internal byte order
pub fn txid_bytes_to_str(bytes: &[u8]) -> Result<String> {
    if bytes.len() != TXID_LEN {
        return Err(MapperError::MalformedMessage(format!(
            "txid must be {} bytes, got {}",
            TXID_LEN,
            bytes.len()
        )));
    }

    let mut reversed = bytes.to_vec();
    reversed.reverse();
    Ok(hex::encode(reversed))
}

/// Canonical display txid of a channel point, from either representation
pub fn funding_txid_str(chan_point: &ChannelPoint) -> Result<String> {
    match &chan_point.funding_txid {
        Some(channel_point::FundingTxid::FundingTxidBytes(bytes)) => txid_bytes_to_str(bytes),
        Some(channel_point::FundingTxid::FundingTxidStr(s)) => {
            let decoded = hex::decode(s).map_err(|e| {
                MapperError::MalformedMessage(format!("invalid funding txid {}: {}", s, e))
            })?;
            if decoded.len() != TXID_LEN {
                return Err(MapperError::MalformedMessage(format!(
                    "invalid funding txid length {}",
                    s.len()
                )));
            }
            Ok(s.to_lowercase())
        }
        None => Err(MapperError::MalformedMessage(
            "channel point has no funding txid".to_string(),
        )),
    }
}
