// packages/privacy-mapper/src/rewrite/handlers.rs
//! Per-method rewrite logic
//!
//! Each handler runs its store work inside one transaction: either every
//! identifier in the message is substituted or the call fails and the message
//! is dropped.

use crate::interception::checker::{MessageHandler, Transform, TransformResult};
use crate::interception::event::CallContext;
use crate::rewrite::fuzz::{hide_amount, hide_bool, hide_signed_amount, hide_timestamp};
use crate::rewrite::RewriteEnv;
use crate::rpc::lnrpc::{
    channel_point, funding_txid_str, policy_update_request, txid_bytes_to_str, ChannelPoint,
    FeeReportResponse, ForwardingHistoryResponse, GetInfoResponse, Htlc, ListChannelsRequest,
    ListChannelsResponse, PolicyUpdateRequest, PolicyUpdateResponse,
};
use crate::store::{
    hide_chan_point, hide_chan_point_str, hide_string, hide_uint64, reveal_bytes,
    reveal_chan_point,
};
use crate::utils::errors::{MapperError, Result};
use chrono::{TimeZone, Utc};
use tracing::debug;

const MSAT_PER_SAT: u64 = 1000;
const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Hides the node identity and clears alias and URIs
pub struct HideNodeInfo<'a> {
    env: RewriteEnv<'a>,
}

impl<'a> HideNodeInfo<'a> {
    pub fn new(env: RewriteEnv<'a>) -> Self {
        Self { env }
    }
}

impl MessageHandler<GetInfoResponse> for HideNodeInfo<'_> {
    fn handle(&self, ctx: &CallContext, mut resp: GetInfoResponse) -> TransformResult<GetInfoResponse> {
        ctx.ensure_active()?;

        self.env.db.update(&mut |tx| {
            resp.identity_pubkey = hide_string(tx, &resp.identity_pubkey)?;
            Ok(())
        })?;

        // No pseudonym exists for these.
        resp.alias.clear();
        resp.uris.clear();

        Ok(Transform::Replacement(resp))
    }
}

/// Hides channel IDs and fuzzes amounts and timestamps of forwarding events
pub struct HideForwardingHistory<'a> {
    env: RewriteEnv<'a>,
}

impl<'a> HideForwardingHistory<'a> {
    pub fn new(env: RewriteEnv<'a>) -> Self {
        Self { env }
    }
}

impl MessageHandler<ForwardingHistoryResponse> for HideForwardingHistory<'_> {
    fn handle(
        &self,
        ctx: &CallContext,
        mut resp: ForwardingHistoryResponse,
    ) -> TransformResult<ForwardingHistoryResponse> {
        ctx.ensure_active()?;

        let random = self.env.random;
        let fuzz = self.env.fuzz;

        self.env.db.update(&mut |tx| {
            for fe in resp.forwarding_events.iter_mut() {
                ctx.ensure_active()?;

                fe.chan_id_in = hide_uint64(tx, fe.chan_id_in)?;
                fe.chan_id_out = hide_uint64(tx, fe.chan_id_out)?;

                fe.amt_out_msat = hide_amount(random, fuzz.relative_amount_variation, fe.amt_out_msat)?;
                fe.fee_msat = hide_amount(random, fuzz.relative_amount_variation, fe.fee_msat)?;

                fe.amt_in_msat = fe.amt_out_msat.saturating_add(fe.fee_msat);
                fe.amt_out = fe.amt_out_msat / MSAT_PER_SAT;
                fe.amt_in = fe.amt_in_msat / MSAT_PER_SAT;
                fe.fee = fe.fee_msat / MSAT_PER_SAT;

                if let Ok(ns) = i64::try_from(fe.timestamp_ns) {
                    let hidden = hide_timestamp(
                        random,
                        fuzz.absolute_time_variation,
                        Utc.timestamp_nanos(ns),
                    )?;
                    let hidden_ns = hidden.timestamp_nanos_opt().unwrap_or(ns) as u64;
                    fe.timestamp_ns = hidden_ns;
                    fe.timestamp = hidden_ns / NANOS_PER_SEC;
                }

                fe.peer_alias_in.clear();
                fe.peer_alias_out.clear();
            }
            Ok(())
        })?;

        debug!("Rewrote {} forwarding events", resp.forwarding_events.len());

        Ok(Transform::Replacement(resp))
    }
}

/// Hides channel IDs and channel points of the fee report
pub struct HideFeeReport<'a> {
    env: RewriteEnv<'a>,
}

impl<'a> HideFeeReport<'a> {
    pub fn new(env: RewriteEnv<'a>) -> Self {
        Self { env }
    }
}

impl MessageHandler<FeeReportResponse> for HideFeeReport<'_> {
    fn handle(&self, ctx: &CallContext, mut resp: FeeReportResponse) -> TransformResult<FeeReportResponse> {
        ctx.ensure_active()?;

        self.env.db.update(&mut |tx| {
            for c in resp.channel_fees.iter_mut() {
                ctx.ensure_active()?;

                c.chan_id = hide_uint64(tx, c.chan_id)?;
                c.channel_point = hide_chan_point_str(tx, &c.channel_point)?;
            }
            Ok(())
        })?;

        Ok(Transform::Replacement(resp))
    }
}

/// Resolves a pseudonymous peer filter back to the real pubkey
pub struct RevealPeerFilter<'a> {
    env: RewriteEnv<'a>,
}

impl<'a> RevealPeerFilter<'a> {
    pub fn new(env: RewriteEnv<'a>) -> Self {
        Self { env }
    }
}

impl MessageHandler<ListChannelsRequest> for RevealPeerFilter<'_> {
    fn handle(&self, ctx: &CallContext, mut req: ListChannelsRequest) -> TransformResult<ListChannelsRequest> {
        if req.peer.is_empty() {
            return Ok(Transform::NoChange);
        }

        ctx.ensure_active()?;

        self.env.db.view(&mut |tx| {
            req.peer = reveal_bytes(tx, &req.peer)?;
            Ok(())
        })?;

        Ok(Transform::Replacement(req))
    }
}

/// Hides identities and fuzzes balances of every listed channel
pub struct HideChannelList<'a> {
    env: RewriteEnv<'a>,
}

impl<'a> HideChannelList<'a> {
    pub fn new(env: RewriteEnv<'a>) -> Self {
        Self { env }
    }
}

impl MessageHandler<ListChannelsResponse> for HideChannelList<'_> {
    fn handle(&self, ctx: &CallContext, mut resp: ListChannelsResponse) -> TransformResult<ListChannelsResponse> {
        ctx.ensure_active()?;

        let random = self.env.random;
        let variation = self.env.fuzz.relative_amount_variation;
        let hide = |amount: i64| hide_signed_amount(random, variation, amount);

        self.env.db.update(&mut |tx| {
            for ch in resp.channels.iter_mut() {
                ctx.ensure_active()?;

                ch.remote_pubkey = hide_string(tx, &ch.remote_pubkey)?;
                ch.channel_point = hide_chan_point_str(tx, &ch.channel_point)?;
                ch.chan_id = hide_uint64(tx, ch.chan_id)?;
                ch.peer_alias.clear();

                ch.initiator = hide_bool(random)?;

                // Capacity is public. The commitment fee is charged to the
                // initiator, so the two balances plus the fee always add up
                // to the capacity.
                let (capacity, commit_fee) = channel_funds(ch.capacity, ch.commit_fee)?;

                let mut local = hide(ch.local_balance)?.min(capacity);
                if ch.initiator {
                    local -= commit_fee;
                }
                local = local.clamp(0, capacity - commit_fee);

                ch.local_balance = local;
                ch.remote_balance = capacity - local - commit_fee;

                ch.total_satoshis_received = hide(ch.total_satoshis_received)?;
                ch.total_satoshis_sent = hide(ch.total_satoshis_sent)?;

                // Only the number of unsettled HTLCs is kept.
                ch.pending_htlcs = vec![Htlc::default(); ch.pending_htlcs.len()];
                ch.unsettled_balance = hide(ch.unsettled_balance)?;
            }
            Ok(())
        })?;

        debug!("Rewrote {} channels", resp.channels.len());

        Ok(Transform::Replacement(resp))
    }
}

/// Validated capacity and commitment fee of a channel
///
/// With both non-negative and the fee within the capacity, the balance
/// arithmetic below cannot overflow.
fn channel_funds(capacity: i64, commit_fee: i64) -> Result<(i64, i64)> {
    if capacity < 0 || commit_fee < 0 {
        return Err(MapperError::MalformedMessage(format!(
            "negative channel funds: capacity {}, commit fee {}",
            capacity, commit_fee
        )));
    }

    if commit_fee > capacity {
        return Err(MapperError::MalformedMessage(format!(
            "commit fee {} exceeds capacity {}",
            commit_fee, capacity
        )));
    }

    Ok((capacity, commit_fee))
}

/// Resolves a pseudonymous channel point in a policy update
pub struct RevealPolicyScope<'a> {
    env: RewriteEnv<'a>,
}

impl<'a> RevealPolicyScope<'a> {
    pub fn new(env: RewriteEnv<'a>) -> Self {
        Self { env }
    }
}

impl MessageHandler<PolicyUpdateRequest> for RevealPolicyScope<'_> {
    fn handle(&self, ctx: &CallContext, mut req: PolicyUpdateRequest) -> TransformResult<PolicyUpdateRequest> {
        // Without a channel point the update applies globally.
        let (txid, index) = match &req.scope {
            Some(policy_update_request::Scope::ChanPoint(cp)) => (funding_txid_str(cp)?, cp.output_index),
            _ => return Ok(Transform::NoChange),
        };

        ctx.ensure_active()?;

        let mut real = (String::new(), 0);
        self.env.db.view(&mut |tx| {
            real = reveal_chan_point(tx, &txid, index)?;
            Ok(())
        })?;

        let (real_txid, real_index) = real;
        req.scope = Some(policy_update_request::Scope::ChanPoint(ChannelPoint {
            funding_txid: Some(channel_point::FundingTxid::FundingTxidStr(real_txid)),
            output_index: real_index,
        }));

        Ok(Transform::Replacement(req))
    }
}

/// Hides the outpoints of failed policy updates
pub struct HideFailedUpdates<'a> {
    env: RewriteEnv<'a>,
}

impl<'a> HideFailedUpdates<'a> {
    pub fn new(env: RewriteEnv<'a>) -> Self {
        Self { env }
    }
}

impl MessageHandler<PolicyUpdateResponse> for HideFailedUpdates<'_> {
    fn handle(&self, ctx: &CallContext, mut resp: PolicyUpdateResponse) -> TransformResult<PolicyUpdateResponse> {
        if resp.failed_updates.is_empty() {
            return Ok(Transform::NoChange);
        }

        ctx.ensure_active()?;

        self.env.db.update(&mut |tx| {
            for update in resp.failed_updates.iter_mut() {
                ctx.ensure_active()?;

                let Some(outpoint) = update.outpoint.as_mut() else {
                    continue;
                };

                let txid = if outpoint.txid_str.is_empty() {
                    txid_bytes_to_str(&outpoint.txid_bytes)?
                } else {
                    outpoint.txid_str.clone()
                };

                let (hidden_txid, hidden_index) = hide_chan_point(tx, &txid, outpoint.output_index)?;
                outpoint.txid_bytes.clear();
                outpoint.txid_str = hidden_txid;
                outpoint.output_index = hidden_index;
            }
            Ok(())
        })?;

        Ok(Transform::Replacement(resp))
    }
}
