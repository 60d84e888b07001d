// packages/privacy-mapper/src/interception/privacy_mapper.rs
//! Privacy mapper interceptor
//!
//! Replaces real identifiers in outgoing responses with session-scoped
//! pseudonyms, fuzzes amounts and timestamps, and resolves pseudonyms in
//! incoming requests back to real values. Methods without a checker are
//! rejected in both directions.

use crate::interception::checker::Transform;
use crate::interception::event::{CallContext, InterceptEvent, InterceptOutcome, RpcPayload};
use crate::interception::registry::checkers_for;
use crate::interception::session::{RootKeyPrefix, SessionId, SessionIdSource};
use crate::observability;
use crate::random::RandomSource;
use crate::rewrite::{FuzzParameters, RewriteEnv};
use crate::rpc::wire::{parse_message, RpcMessage};
use crate::store::PrivacyMapStore;
use crate::utils::errors::{MapperError, Result};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Registration name of the interceptor
pub const PRIVACY_MAPPER_NAME: &str = "lit-privacy-mapper";

/// Condition that activates the interceptor for a session
pub const CONDITION_PRIVACY: &str = "privacy";

/// Interceptor contract of the host middleware
pub trait RequestInterceptor: Send + Sync {
    /// Stable identifier for registration and logging
    fn name(&self) -> &str;

    /// Read-only interceptors may not name a custom condition
    fn read_only(&self) -> bool;

    /// Condition that activates this interceptor
    fn custom_condition(&self) -> &str;

    /// Process one interception event
    fn intercept(&self, ctx: &CallContext, event: &InterceptEvent) -> Result<InterceptOutcome>;
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Request,
    Response,
}

impl Phase {
    fn as_str(&self) -> &'static str {
        match self {
            Phase::Request => "request",
            Phase::Response => "response",
        }
    }
}

/// Pseudonymizing interceptor
pub struct PrivacyMapper {
    store: Arc<dyn PrivacyMapStore>,
    random: Arc<dyn RandomSource>,
    sessions: Arc<dyn SessionIdSource>,
    fuzz: FuzzParameters,
}

impl PrivacyMapper {
    /// Create a privacy mapper drawing fuzz randomness from `random`
    pub fn new(store: Arc<dyn PrivacyMapStore>, random: Arc<dyn RandomSource>) -> Self {
        Self {
            store,
            random,
            sessions: Arc::new(RootKeyPrefix),
            fuzz: FuzzParameters::DEFAULT,
        }
    }

    /// Use a different credential to session mapping
    pub fn with_session_source(mut self, sessions: Arc<dyn SessionIdSource>) -> Self {
        self.sessions = sessions;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_fuzz_parameters(mut self, fuzz: FuzzParameters) -> Self {
        self.fuzz = fuzz;
        self
    }

    fn intercept_rpc(
        &self,
        ctx: &CallContext,
        phase: Phase,
        payload: &RpcPayload,
        session: SessionId,
    ) -> InterceptOutcome {
        // Errors of the original call are not rewritten.
        if matches!(phase, Phase::Response) && payload.is_error {
            return InterceptOutcome::Accept;
        }

        let msg = match parse_message(&payload.type_name, &payload.serialized) {
            Ok(msg) => msg,
            Err(err) => return InterceptOutcome::Reject(err),
        };

        let replacement = match self.rewrite(ctx, phase, &payload.method_full_uri, msg, session) {
            Ok(Transform::NoChange) => return InterceptOutcome::Accept,
            Ok(Transform::Replacement(replacement)) => replacement,
            Err(err) => return InterceptOutcome::Reject(err),
        };

        match replacement.encode_replacement(&payload.serialized) {
            Ok(serialized) => InterceptOutcome::Replace {
                type_name: replacement.type_name().to_string(),
                serialized,
            },
            Err(err) => InterceptOutcome::Reject(err),
        }
    }

    fn rewrite(
        &self,
        ctx: &CallContext,
        phase: Phase,
        method: &str,
        msg: RpcMessage,
        session: SessionId,
    ) -> Result<Transform<RpcMessage>> {
        ctx.ensure_active()?;

        let db = self.store.session_db(session);
        let env = RewriteEnv::new(db.as_ref(), self.random.as_ref(), self.fuzz);
        let checkers = checkers_for(env);

        // Unknown methods never pass, in either direction.
        let checker = checkers.get(method).ok_or(MapperError::UnsupportedMethod)?;

        let handles = match phase {
            Phase::Request => checker.handles_request(msg.type_name()),
            Phase::Response => checker.handles_response(msg.type_name()),
        };
        if !handles {
            return Err(MapperError::TypeMismatch {
                method: method.to_string(),
                phase: phase.as_str(),
                actual: msg.type_name().to_string(),
            });
        }

        match phase {
            Phase::Request => checker.handle_request(ctx, msg),
            Phase::Response => checker.handle_response(ctx, msg),
        }
    }
}

impl RequestInterceptor for PrivacyMapper {
    fn name(&self) -> &str {
        PRIVACY_MAPPER_NAME
    }

    fn read_only(&self) -> bool {
        false
    }

    fn custom_condition(&self) -> &str {
        CONDITION_PRIVACY
    }

    fn intercept(&self, ctx: &CallContext, event: &InterceptEvent) -> Result<InterceptOutcome> {
        // Every event must belong to a session, streams included.
        let session = self.sessions.session_id(event.credential())?;

        trace!(
            "PrivacyMapper: Intercepting {} of {} for session {}",
            event.phase(),
            event.method(),
            session
        );

        let outcome = match event {
            InterceptEvent::StreamAuth { .. } => {
                InterceptOutcome::Reject(MapperError::StreamsUnsupported)
            }
            InterceptEvent::Request(payload) => {
                self.intercept_rpc(ctx, Phase::Request, payload, session)
            }
            InterceptEvent::Response(payload) => {
                self.intercept_rpc(ctx, Phase::Response, payload, session)
            }
        };

        match &outcome {
            InterceptOutcome::Reject(err) => {
                warn!(
                    "Rejecting {} of {}: {}",
                    event.phase(),
                    event.method(),
                    err
                );
                observability::record_rejection(err.kind());
            }
            other => debug!("{} of {}: {}", event.phase(), event.method(), other.label()),
        }
        observability::record_intercept(event.phase(), outcome.label());

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeededRandom;
    use crate::rpc::lnrpc::*;
    use crate::rpc::methods;
    use crate::rpc::wire::WireMessage;
    use crate::store::{
        hide_chan_point, hide_uint64, reveal_string, reveal_uint64, InMemoryPrivacyStore, PrivacyMapTx,
    };
    use prost::Message;
    use tokio_util::sync::CancellationToken;

    const CREDENTIAL: [u8; 6] = [0xca, 0xfe, 0xba, 0xbe, 0x00, 0x01];
    const SESSION: SessionId = SessionId::new([0xca, 0xfe, 0xba, 0xbe]);
    const TXID: &str = "0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f20";
    const PUBKEY: &str = "03aa00000000000000000000000000000000000000000000000000000000000011";

    fn mapper() -> (PrivacyMapper, Arc<InMemoryPrivacyStore>) {
        let store = Arc::new(InMemoryPrivacyStore::new());
        let mapper = PrivacyMapper::new(store.clone(), Arc::new(SeededRandom::new(42)));
        (mapper, store)
    }

    fn payload<M: WireMessage>(method: &str, msg: &M) -> RpcPayload {
        RpcPayload {
            method_full_uri: method.to_string(),
            type_name: M::TYPE_NAME.to_string(),
            serialized: msg.encode_to_vec(),
            is_error: false,
            credential: CREDENTIAL.to_vec(),
        }
    }

    fn request<M: WireMessage>(method: &str, msg: &M) -> InterceptEvent {
        InterceptEvent::Request(payload(method, msg))
    }

    fn response<M: WireMessage>(method: &str, msg: &M) -> InterceptEvent {
        InterceptEvent::Response(payload(method, msg))
    }

    fn replaced<M: WireMessage>(outcome: InterceptOutcome) -> M {
        match outcome {
            InterceptOutcome::Replace {
                type_name,
                serialized,
            } => {
                assert_eq!(type_name, M::TYPE_NAME);
                M::decode(serialized.as_slice()).unwrap()
            }
            other => panic!("expected replacement, got {:?}", other),
        }
    }

    fn db_update(store: &InMemoryPrivacyStore, f: &mut dyn FnMut(&mut dyn PrivacyMapTx) -> Result<()>) {
        store.session_db(SESSION).update(f).unwrap();
    }

    #[test]
    fn test_interceptor_registration() {
        let (mapper, _) = mapper();
        assert_eq!(mapper.name(), "lit-privacy-mapper");
        assert!(!mapper.read_only());
        assert_eq!(mapper.custom_condition(), "privacy");
    }

    #[test]
    fn test_stream_auth_rejected() {
        let (mapper, _) = mapper();
        let event = InterceptEvent::StreamAuth {
            method_full_uri: "/lnrpc.Lightning/SubscribeInvoices".to_string(),
            credential: CREDENTIAL.to_vec(),
        };

        let outcome = mapper.intercept(&CallContext::new(), &event).unwrap();
        assert!(matches!(
            outcome,
            InterceptOutcome::Reject(MapperError::StreamsUnsupported)
        ));
    }

    #[test]
    fn test_stream_auth_with_bad_credential_fails() {
        let (mapper, _) = mapper();
        let event = InterceptEvent::StreamAuth {
            method_full_uri: "/lnrpc.Lightning/SubscribeInvoices".to_string(),
            credential: vec![0xca],
        };

        let result = mapper.intercept(&CallContext::new(), &event);
        assert!(matches!(result, Err(MapperError::InvalidCredential(_))));
    }

    /// Maps every credential to one session
    struct FixedSession(SessionId);

    impl SessionIdSource for FixedSession {
        fn session_id(&self, _credential: &[u8]) -> Result<SessionId> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_custom_session_source() {
        let shared = SessionId::new([7, 7, 7, 7]);
        let (mapper, store) = mapper();
        let mapper = mapper.with_session_source(Arc::new(FixedSession(shared)));

        let info = GetInfoResponse {
            identity_pubkey: PUBKEY.to_string(),
            ..Default::default()
        };
        let mut pseudonyms = Vec::new();
        for credential in [vec![1, 1, 1, 1], vec![2, 2, 2, 2]] {
            let mut p = payload(methods::GET_INFO, &info);
            p.credential = credential;
            let out: GetInfoResponse = replaced(
                mapper
                    .intercept(&CallContext::new(), &InterceptEvent::Response(p))
                    .unwrap(),
            );
            pseudonyms.push(out.identity_pubkey);
        }

        assert_eq!(pseudonyms[0], pseudonyms[1]);
        assert_eq!(shared.as_bytes(), &[7, 7, 7, 7]);
        assert_eq!(store.session_count(), 1);
        assert_eq!(store.mapping_count(shared), 1);
        assert_eq!(store.mapping_count(SESSION), 0);
    }

    #[test]
    fn test_node_info_hidden() {
        let (mapper, store) = mapper();
        let info = GetInfoResponse {
            identity_pubkey: PUBKEY.to_string(),
            alias: "alice-node".to_string(),
            uris: vec!["1.2.3.4:9735".to_string()],
            block_height: 800_000,
            ..Default::default()
        };

        let ctx = CallContext::new();
        let first: GetInfoResponse =
            replaced(mapper.intercept(&ctx, &response(methods::GET_INFO, &info)).unwrap());
        let second: GetInfoResponse =
            replaced(mapper.intercept(&ctx, &response(methods::GET_INFO, &info)).unwrap());

        assert_ne!(first.identity_pubkey, PUBKEY);
        assert_eq!(first.identity_pubkey, second.identity_pubkey);
        assert_eq!(first.alias, "");
        assert!(first.uris.is_empty());
        assert_eq!(first.block_height, 800_000);

        store
            .session_db(SESSION)
            .view(&mut |tx| {
                assert_eq!(reveal_string(tx, &first.identity_pubkey)?, PUBKEY);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_node_info_request_passes() {
        let (mapper, store) = mapper();
        let outcome = mapper
            .intercept(&CallContext::new(), &request(methods::GET_INFO, &GetInfoRequest {}))
            .unwrap();
        assert!(matches!(outcome, InterceptOutcome::Accept));
        assert_eq!(store.mapping_count(SESSION), 0);
    }

    #[test]
    fn test_forwarding_history_consistency() {
        let (mapper, store) = mapper();
        let history = ForwardingHistoryResponse {
            forwarding_events: vec![ForwardingEvent {
                chan_id_in: 5,
                chan_id_out: 9,
                amt_out_msat: 100_000,
                fee_msat: 1000,
                amt_in_msat: 101_000,
                timestamp_ns: 1_700_000_000_000_000_000,
                timestamp: 1_700_000_000,
                peer_alias_in: "bob".to_string(),
                ..Default::default()
            }],
            last_offset_index: 1,
        };

        let out: ForwardingHistoryResponse = replaced(
            mapper
                .intercept(&CallContext::new(), &response(methods::FORWARDING_HISTORY, &history))
                .unwrap(),
        );
        let fe = &out.forwarding_events[0];

        let mut expected = (0, 0);
        db_update(&store, &mut |tx| {
            expected = (hide_uint64(tx, 5)?, hide_uint64(tx, 9)?);
            Ok(())
        });
        assert_eq!((fe.chan_id_in, fe.chan_id_out), expected);

        assert!((97_500..=102_500).contains(&fe.amt_out_msat));
        assert!((975..=1025).contains(&fe.fee_msat));
        assert_eq!(fe.amt_in_msat, fe.amt_out_msat + fe.fee_msat);
        assert_eq!(fe.amt_out, fe.amt_out_msat / 1000);
        assert_eq!(fe.amt_in, fe.amt_in_msat / 1000);
        assert_eq!(fe.fee, fe.fee_msat / 1000);

        let drift = fe.timestamp_ns as i64 - 1_700_000_000_000_000_000i64;
        assert!(drift.abs() <= 300_000_000_000);
        assert_eq!(fe.timestamp, fe.timestamp_ns / 1_000_000_000);
        assert!(fe.peer_alias_in.is_empty());
        assert_eq!(out.last_offset_index, 1);
    }

    #[test]
    fn test_fee_report_hidden() {
        let (mapper, store) = mapper();
        let report = FeeReportResponse {
            channel_fees: vec![ChannelFeeReport {
                chan_id: 77,
                channel_point: format!("{}:0", TXID),
                fee_per_mil: 100,
                ..Default::default()
            }],
            day_fee_sum: 12,
            ..Default::default()
        };

        let out: FeeReportResponse = replaced(
            mapper
                .intercept(&CallContext::new(), &response(methods::FEE_REPORT, &report))
                .unwrap(),
        );
        let fee = &out.channel_fees[0];

        assert_ne!(fee.channel_point, report.channel_fees[0].channel_point);
        assert_eq!(fee.fee_per_mil, 100);
        assert_eq!(out.day_fee_sum, 12);
        store
            .session_db(SESSION)
            .view(&mut |tx| {
                assert_eq!(reveal_uint64(tx, fee.chan_id)?, 77);
                assert_eq!(reveal_string(tx, &fee.channel_point)?, format!("{}:0", TXID));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_list_channels_empty_peer_no_store_access() {
        let (mapper, store) = mapper();
        store.set_available(false);

        let outcome = mapper
            .intercept(
                &CallContext::new(),
                &request(methods::LIST_CHANNELS, &ListChannelsRequest::default()),
            )
            .unwrap();
        assert!(matches!(outcome, InterceptOutcome::Accept));
    }

    #[test]
    fn test_list_channels_peer_revealed() {
        let (mapper, _) = mapper();
        let real_peer = hex::decode(PUBKEY).unwrap();

        let channels = ListChannelsResponse {
            channels: vec![Channel {
                remote_pubkey: PUBKEY.to_string(),
                channel_point: format!("{}:1", TXID),
                capacity: 1_000_000,
                local_balance: 400_000,
                ..Default::default()
            }],
        };
        let hidden: ListChannelsResponse = replaced(
            mapper
                .intercept(&CallContext::new(), &response(methods::LIST_CHANNELS, &channels))
                .unwrap(),
        );

        let filter = ListChannelsRequest {
            peer: hex::decode(&hidden.channels[0].remote_pubkey).unwrap(),
            active_only: true,
            ..Default::default()
        };
        let revealed: ListChannelsRequest = replaced(
            mapper
                .intercept(&CallContext::new(), &request(methods::LIST_CHANNELS, &filter))
                .unwrap(),
        );

        assert_eq!(revealed.peer, real_peer);
        assert!(revealed.active_only);
    }

    #[test]
    fn test_unknown_peer_filter_rejected() {
        let (mapper, _) = mapper();
        let filter = ListChannelsRequest {
            peer: vec![0x02; 33],
            ..Default::default()
        };

        let outcome = mapper
            .intercept(&CallContext::new(), &request(methods::LIST_CHANNELS, &filter))
            .unwrap();
        assert!(matches!(
            outcome,
            InterceptOutcome::Reject(MapperError::PseudonymNotFound(_))
        ));
    }

    #[test]
    fn test_global_policy_update_passes() {
        let (mapper, _) = mapper();
        let update = PolicyUpdateRequest {
            scope: Some(policy_update_request::Scope::Global(true)),
            base_fee_msat: 1000,
            ..Default::default()
        };

        let outcome = mapper
            .intercept(&CallContext::new(), &request(methods::UPDATE_CHANNEL_POLICY, &update))
            .unwrap();
        assert!(matches!(outcome, InterceptOutcome::Accept));
    }

    #[test]
    fn test_policy_update_round_trip() {
        let (mapper, store) = mapper();

        let mut hidden = (String::new(), 0);
        db_update(&store, &mut |tx| {
            hidden = hide_chan_point(tx, TXID, 2)?;
            Ok(())
        });

        let update = PolicyUpdateRequest {
            scope: Some(policy_update_request::Scope::ChanPoint(ChannelPoint {
                funding_txid: Some(channel_point::FundingTxid::FundingTxidStr(hidden.0.clone())),
                output_index: hidden.1,
            })),
            fee_rate_ppm: 500,
            ..Default::default()
        };
        let revealed: PolicyUpdateRequest = replaced(
            mapper
                .intercept(&CallContext::new(), &request(methods::UPDATE_CHANNEL_POLICY, &update))
                .unwrap(),
        );
        match revealed.scope {
            Some(policy_update_request::Scope::ChanPoint(cp)) => {
                assert_eq!(
                    cp.funding_txid,
                    Some(channel_point::FundingTxid::FundingTxidStr(TXID.to_string()))
                );
                assert_eq!(cp.output_index, 2);
            }
            other => panic!("unexpected scope {:?}", other),
        }
        assert_eq!(revealed.fee_rate_ppm, 500);

        let failed = PolicyUpdateResponse {
            failed_updates: vec![FailedUpdate {
                outpoint: Some(OutPoint {
                    txid_bytes: vec![0u8; 32],
                    txid_str: TXID.to_string(),
                    output_index: 2,
                }),
                reason: UpdateFailure::NotFound as i32,
                update_error: "not found".to_string(),
            }],
        };
        let out: PolicyUpdateResponse = replaced(
            mapper
                .intercept(&CallContext::new(), &response(methods::UPDATE_CHANNEL_POLICY, &failed))
                .unwrap(),
        );
        let outpoint = out.failed_updates[0].outpoint.as_ref().unwrap();
        assert!(outpoint.txid_bytes.is_empty());
        assert_eq!((outpoint.txid_str.clone(), outpoint.output_index), hidden);
    }

    #[test]
    fn test_policy_update_keeps_untouched_fields() {
        let (mapper, store) = mapper();

        let mut hidden = (String::new(), 0);
        db_update(&store, &mut |tx| {
            hidden = hide_chan_point(tx, TXID, 0)?;
            Ok(())
        });

        let update = PolicyUpdateRequest {
            scope: Some(policy_update_request::Scope::ChanPoint(ChannelPoint {
                funding_txid: Some(channel_point::FundingTxid::FundingTxidStr(hidden.0.clone())),
                output_index: hidden.1,
            })),
            time_lock_delta: 80,
            inbound_fee: Some(InboundFee {
                base_fee_msat: -5,
                fee_rate_ppm: -100,
            }),
            create_missing_edge: true,
            ..Default::default()
        };
        let mut p = payload(methods::UPDATE_CHANNEL_POLICY, &update);
        // A field newer than the declarations: tag 50, varint 1.
        p.serialized.extend_from_slice(&[0x90, 0x03, 0x01]);

        let outcome = mapper
            .intercept(&CallContext::new(), &InterceptEvent::Request(p))
            .unwrap();
        let serialized = match &outcome {
            InterceptOutcome::Replace { serialized, .. } => serialized.clone(),
            other => panic!("expected replacement, got {:?}", other),
        };
        assert!(serialized.ends_with(&[0x90, 0x03, 0x01]));

        let revealed: PolicyUpdateRequest = replaced(outcome);
        assert_eq!(
            revealed.inbound_fee,
            Some(InboundFee {
                base_fee_msat: -5,
                fee_rate_ppm: -100,
            })
        );
        assert!(revealed.create_missing_edge);
        assert_eq!(revealed.time_lock_delta, 80);
    }

    #[test]
    fn test_channel_list_keeps_untouched_fields() {
        let (mapper, _) = mapper();
        let constraints = ChannelConstraints {
            csv_delay: 144,
            chan_reserve_sat: 10_000,
            max_accepted_htlcs: 483,
            ..Default::default()
        };
        let channels = ListChannelsResponse {
            channels: vec![Channel {
                remote_pubkey: PUBKEY.to_string(),
                channel_point: format!("{}:1", TXID),
                capacity: 1_000_000,
                local_balance: 400_000,
                csv_delay: 144,
                commitment_type: CommitmentType::Anchors as i32,
                local_constraints: Some(constraints.clone()),
                memo: "routing".to_string(),
                ..Default::default()
            }],
        };

        let hidden: ListChannelsResponse = replaced(
            mapper
                .intercept(&CallContext::new(), &response(methods::LIST_CHANNELS, &channels))
                .unwrap(),
        );
        let ch = &hidden.channels[0];

        assert_eq!(ch.csv_delay, 144);
        assert_eq!(ch.commitment_type, CommitmentType::Anchors as i32);
        assert_eq!(ch.local_constraints, Some(constraints));
        assert_eq!(ch.memo, "routing");
    }

    #[test]
    fn test_node_info_keeps_chains_and_features() {
        let (mapper, _) = mapper();
        let mut info = GetInfoResponse {
            identity_pubkey: PUBKEY.to_string(),
            chains: vec![Chain {
                chain: "bitcoin".to_string(),
                network: "mainnet".to_string(),
            }],
            ..Default::default()
        };
        info.features.insert(
            9,
            Feature {
                name: "tlv-onion".to_string(),
                is_required: false,
                is_known: true,
            },
        );

        let hidden: GetInfoResponse =
            replaced(mapper.intercept(&CallContext::new(), &response(methods::GET_INFO, &info)).unwrap());

        assert_eq!(hidden.chains, info.chains);
        assert_eq!(hidden.features, info.features);
    }

    #[test]
    fn test_empty_policy_response_passes() {
        let (mapper, _) = mapper();
        let outcome = mapper
            .intercept(
                &CallContext::new(),
                &response(methods::UPDATE_CHANNEL_POLICY, &PolicyUpdateResponse::default()),
            )
            .unwrap();
        assert!(matches!(outcome, InterceptOutcome::Accept));
    }

    #[test]
    fn test_unknown_method_denied_both_ways() {
        let (mapper, _) = mapper();
        let ctx = CallContext::new();

        let req = mapper
            .intercept(&ctx, &request("/unknown.Service/Method", &GetInfoRequest {}))
            .unwrap();
        let resp = mapper
            .intercept(&ctx, &response("/unknown.Service/Method", &GetInfoResponse::default()))
            .unwrap();

        for outcome in [req, resp] {
            match outcome {
                InterceptOutcome::Reject(err) => {
                    assert!(matches!(err, MapperError::UnsupportedMethod));
                    assert_eq!(
                        err.to_string(),
                        "this RPC call is not supported by the privacy mapper interceptor"
                    );
                }
                other => panic!("expected rejection, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_error_response_passes_unchanged() {
        let (mapper, _) = mapper();
        let mut p = payload(methods::LIST_CHANNELS, &ListChannelsResponse::default());
        p.is_error = true;
        p.serialized = b"rpc error: code = Unknown".to_vec();
        p.type_name = "lnrpc.Whatever".to_string();

        let outcome = mapper
            .intercept(&CallContext::new(), &InterceptEvent::Response(p))
            .unwrap();
        assert!(matches!(outcome, InterceptOutcome::Accept));
    }

    #[test]
    fn test_malformed_payload_rejected() {
        let (mapper, _) = mapper();
        let mut p = payload(methods::GET_INFO, &GetInfoResponse::default());
        p.serialized = vec![0x0a, 0x0a, 0x01];

        let outcome = mapper
            .intercept(&CallContext::new(), &InterceptEvent::Response(p))
            .unwrap();
        assert!(matches!(
            outcome,
            InterceptOutcome::Reject(MapperError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let (mapper, _) = mapper();
        let outcome = mapper
            .intercept(
                &CallContext::new(),
                &response(methods::GET_INFO, &FeeReportResponse::default()),
            )
            .unwrap();
        assert!(matches!(
            outcome,
            InterceptOutcome::Reject(MapperError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_invalid_credential_fails() {
        let (mapper, _) = mapper();
        let mut p = payload(methods::GET_INFO, &GetInfoRequest {});
        p.credential = vec![1];

        let result = mapper.intercept(&CallContext::new(), &InterceptEvent::Request(p));
        assert!(matches!(result, Err(MapperError::InvalidCredential(_))));
    }

    #[test]
    fn test_store_failure_rejects_without_partial_rewrite() {
        let (mapper, store) = mapper();
        store.set_available(false);

        let info = GetInfoResponse {
            identity_pubkey: PUBKEY.to_string(),
            ..Default::default()
        };
        let outcome = mapper
            .intercept(&CallContext::new(), &response(methods::GET_INFO, &info))
            .unwrap();
        assert!(matches!(
            outcome,
            InterceptOutcome::Reject(MapperError::StoreFailure(_))
        ));
    }

    #[test]
    fn test_bad_fuzz_parameters_rejected() {
        let (mapper, store) = mapper();
        let mapper = mapper.with_fuzz_parameters(FuzzParameters {
            relative_amount_variation: 1.5,
            ..FuzzParameters::DEFAULT
        });

        let history = ForwardingHistoryResponse {
            forwarding_events: vec![ForwardingEvent {
                chan_id_in: 1,
                chan_id_out: 2,
                amt_out_msat: 5000,
                ..Default::default()
            }],
            ..Default::default()
        };
        let outcome = mapper
            .intercept(&CallContext::new(), &response(methods::FORWARDING_HISTORY, &history))
            .unwrap();

        assert!(matches!(
            outcome,
            InterceptOutcome::Reject(MapperError::ParameterOutOfRange(_))
        ));
        // The aborted transaction left no pairs behind.
        assert_eq!(store.mapping_count(SESSION), 0);
    }

    #[test]
    fn test_cancelled_call_rejected() {
        let (mapper, store) = mapper();
        let token = CancellationToken::new();
        token.cancel();

        let info = GetInfoResponse {
            identity_pubkey: PUBKEY.to_string(),
            ..Default::default()
        };
        let outcome = mapper
            .intercept(
                &CallContext::with_cancellation(token),
                &response(methods::GET_INFO, &info),
            )
            .unwrap();

        assert!(matches!(outcome, InterceptOutcome::Reject(MapperError::Cancelled)));
        assert_eq!(store.mapping_count(SESSION), 0);
    }

    #[tokio::test]
    async fn test_concurrent_sessions_are_independent() {
        let store = Arc::new(InMemoryPrivacyStore::new());
        let mapper = Arc::new(PrivacyMapper::new(
            store.clone(),
            Arc::new(crate::random::CryptoRandom::new()),
        ));

        let mut handles = Vec::new();
        for i in 0..8u8 {
            let mapper = Arc::clone(&mapper);
            handles.push(tokio::task::spawn_blocking(move || {
                let mut p = payload(
                    methods::GET_INFO,
                    &GetInfoResponse {
                        identity_pubkey: PUBKEY.to_string(),
                        ..Default::default()
                    },
                );
                p.credential = vec![i, 0, 0, 0];
                let out: GetInfoResponse = replaced(
                    mapper
                        .intercept(&CallContext::new(), &InterceptEvent::Response(p))
                        .unwrap(),
                );
                out.identity_pubkey
            }));
        }

        for handle in handles {
            let pseudonym = handle.await.unwrap();
            assert_eq!(pseudonym.len(), PUBKEY.len());
            assert_ne!(pseudonym, PUBKEY);
        }
        assert_eq!(store.session_count(), 8);
    }
}
