// packages/privacy-mapper/src/interception/registry.rs
//! Checker registry
//!
//! Maps each supported method to its checker, bound to the current session's
//! store handle. The table is rebuilt for every dispatch call. Supporting
//! another method means adding an entry here.

use crate::interception::checker::{
    pass_through_errors, FullRewriter, ResponseRewriter, RoundTripChecker,
};
use crate::rewrite::handlers::{
    HideChannelList, HideFailedUpdates, HideFeeReport, HideForwardingHistory, HideNodeInfo,
    RevealPeerFilter, RevealPolicyScope,
};
use crate::rewrite::RewriteEnv;
use crate::rpc::lnrpc::{
    FeeReportRequest, FeeReportResponse, ForwardingHistoryRequest, ForwardingHistoryResponse,
    GetInfoRequest, GetInfoResponse, ListChannelsRequest, ListChannelsResponse,
    PolicyUpdateRequest, PolicyUpdateResponse,
};
use crate::rpc::methods;
use std::collections::HashMap;

/// Method identifier to checker
pub type CheckerTable<'a> = HashMap<&'static str, Box<dyn RoundTripChecker + 'a>>;

/// Every method the privacy mapper lets through
pub const SUPPORTED_METHODS: [&str; 5] = [
    methods::GET_INFO,
    methods::FORWARDING_HISTORY,
    methods::FEE_REPORT,
    methods::LIST_CHANNELS,
    methods::UPDATE_CHANNEL_POLICY,
];

/// Build the checker table for one call
pub fn checkers_for(env: RewriteEnv<'_>) -> CheckerTable<'_> {
    let mut table: CheckerTable<'_> = HashMap::with_capacity(SUPPORTED_METHODS.len());

    table.insert(
        methods::GET_INFO,
        Box::new(ResponseRewriter::<GetInfoRequest, GetInfoResponse, _>::response_only(
            methods::GET_INFO,
            HideNodeInfo::new(env),
            pass_through_errors,
        )),
    );

    table.insert(
        methods::FORWARDING_HISTORY,
        Box::new(ResponseRewriter::<ForwardingHistoryRequest, ForwardingHistoryResponse, _>::response_only(
            methods::FORWARDING_HISTORY,
            HideForwardingHistory::new(env),
            pass_through_errors,
        )),
    );

    table.insert(
        methods::FEE_REPORT,
        Box::new(ResponseRewriter::<FeeReportRequest, FeeReportResponse, _>::response_only(
            methods::FEE_REPORT,
            HideFeeReport::new(env),
            pass_through_errors,
        )),
    );

    table.insert(
        methods::LIST_CHANNELS,
        Box::new(FullRewriter::<ListChannelsRequest, ListChannelsResponse, _, _>::new(
            methods::LIST_CHANNELS,
            RevealPeerFilter::new(env),
            HideChannelList::new(env),
            pass_through_errors,
        )),
    );

    table.insert(
        methods::UPDATE_CHANNEL_POLICY,
        Box::new(FullRewriter::<PolicyUpdateRequest, PolicyUpdateResponse, _, _>::new(
            methods::UPDATE_CHANNEL_POLICY,
            RevealPolicyScope::new(env),
            HideFailedUpdates::new(env),
            pass_through_errors,
        )),
    );

    table
}
