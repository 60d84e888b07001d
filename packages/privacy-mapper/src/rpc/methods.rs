// packages/privacy-mapper/src/rpc/methods.rs
//! Fully-qualified method identifiers handled by the privacy mapper

pub const GET_INFO: &str = "/lnrpc.Lightning/GetInfo";
pub const FORWARDING_HISTORY: &str = "/lnrpc.Lightning/ForwardingHistory";
pub const FEE_REPORT: &str = "/lnrpc.Lightning/FeeReport";
pub const LIST_CHANNELS: &str = "/lnrpc.Lightning/ListChannels";
pub const UPDATE_CHANNEL_POLICY: &str = "/lnrpc.Lightning/UpdateChannelPolicy";
