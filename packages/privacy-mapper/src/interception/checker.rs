// packages/privacy-mapper/src/interception/checker.rs
//! Round-trip checkers
//!
//! A checker governs how one method's request and response are rewritten. It
//! is generic over the concrete request and response types, so the only
//! runtime type check left is unwrapping the decoded [`RpcMessage`].

use crate::interception::event::CallContext;
use crate::rpc::wire::{RpcMessage, WireMessage};
use crate::utils::errors::{MapperError, Result};
use std::marker::PhantomData;

/// Outcome of a successful transformation
#[derive(Debug, Clone, PartialEq)]
pub enum Transform<M> {
    /// Leave the message as it is
    NoChange,

    /// Replace the message
    Replacement(M),
}

impl<M> Transform<M> {
    pub fn map<N, F>(self, f: F) -> Transform<N>
    where
        F: FnOnce(M) -> N,
    {
        match self {
            Transform::NoChange => Transform::NoChange,
            Transform::Replacement(m) => Transform::Replacement(f(m)),
        }
    }
}

/// A transformation either succeeds or rejects the call with an error
pub type TransformResult<M> = Result<Transform<M>>;

/// Rewrites one message type
pub trait MessageHandler<M> {
    fn handle(&self, ctx: &CallContext, msg: M) -> TransformResult<M>;
}

/// Applied to every error a handler returns
pub type ErrorHandler = fn(MapperError) -> MapperError;

/// Hands handler errors to the dispatcher unchanged
pub fn pass_through_errors(err: MapperError) -> MapperError {
    err
}

/// Handler for a request that is never rewritten
pub struct Unchanged;

impl<M> MessageHandler<M> for Unchanged {
    fn handle(&self, _ctx: &CallContext, _msg: M) -> TransformResult<M> {
        Ok(Transform::NoChange)
    }
}

/// Type-erased checker as stored in the registry
pub trait RoundTripChecker {
    fn handles_request(&self, type_name: &str) -> bool;

    fn handles_response(&self, type_name: &str) -> bool;

    fn handle_request(&self, ctx: &CallContext, msg: RpcMessage) -> TransformResult<RpcMessage>;

    fn handle_response(&self, ctx: &CallContext, msg: RpcMessage) -> TransformResult<RpcMessage>;
}

/// Checker rewriting both directions with separate handlers
pub struct FullRewriter<Req, Resp, Q, S> {
    method: &'static str,
    request: Q,
    response: S,
    on_error: ErrorHandler,
    _types: PhantomData<fn() -> (Req, Resp)>,
}

impl<Req, Resp, Q, S> FullRewriter<Req, Resp, Q, S>
where
    Req: WireMessage,
    Resp: WireMessage,
    Q: MessageHandler<Req>,
    S: MessageHandler<Resp>,
{
    pub fn new(method: &'static str, request: Q, response: S, on_error: ErrorHandler) -> Self {
        Self {
            method,
            request,
            response,
            on_error,
            _types: PhantomData,
        }
    }
}

impl<Req, Resp, Q, S> RoundTripChecker for FullRewriter<Req, Resp, Q, S>
where
    Req: WireMessage,
    Resp: WireMessage,
    Q: MessageHandler<Req>,
    S: MessageHandler<Resp>,
{
    fn handles_request(&self, type_name: &str) -> bool {
        type_name == Req::TYPE_NAME
    }

    fn handles_response(&self, type_name: &str) -> bool {
        type_name == Resp::TYPE_NAME
    }

    fn handle_request(&self, ctx: &CallContext, msg: RpcMessage) -> TransformResult<RpcMessage> {
        let req = unwrap_message::<Req>(self.method, "request", msg)?;
        run_handler(&self.request, ctx, req, self.on_error)
    }

    fn handle_response(&self, ctx: &CallContext, msg: RpcMessage) -> TransformResult<RpcMessage> {
        let resp = unwrap_message::<Resp>(self.method, "response", msg)?;
        run_handler(&self.response, ctx, resp, self.on_error)
    }
}

/// Checker for read-only calls: requests pass, responses are rewritten
pub type ResponseRewriter<Req, Resp, S> = FullRewriter<Req, Resp, Unchanged, S>;

impl<Req, Resp, S> FullRewriter<Req, Resp, Unchanged, S>
where
    Req: WireMessage,
    Resp: WireMessage,
    S: MessageHandler<Resp>,
{
    pub fn response_only(method: &'static str, response: S, on_error: ErrorHandler) -> Self {
        Self::new(method, Unchanged, response, on_error)
    }
}

fn unwrap_message<M: WireMessage>(
    method: &'static str,
    phase: &'static str,
    msg: RpcMessage,
) -> Result<M> {
    M::from_rpc(msg).map_err(|other| MapperError::TypeMismatch {
        method: method.to_string(),
        phase,
        actual: other.type_name().to_string(),
    })
}

fn run_handler<M, H>(
    handler: &H,
    ctx: &CallContext,
    msg: M,
    on_error: ErrorHandler,
) -> TransformResult<RpcMessage>
where
    M: WireMessage,
    H: MessageHandler<M>,
{
    let transform = handler.handle(ctx, msg).map_err(on_error)?;
    Ok(transform.map(WireMessage::into_rpc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::lnrpc::{GetInfoRequest, GetInfoResponse};

    struct ClearAlias;

    impl MessageHandler<GetInfoResponse> for ClearAlias {
        fn handle(&self, _ctx: &CallContext, mut msg: GetInfoResponse) -> TransformResult<GetInfoResponse> {
            msg.alias.clear();
            Ok(Transform::Replacement(msg))
        }
    }

    struct Failing;

    impl MessageHandler<GetInfoResponse> for Failing {
        fn handle(&self, _ctx: &CallContext, _msg: GetInfoResponse) -> TransformResult<GetInfoResponse> {
            Err(MapperError::StoreFailure("disk gone".to_string()))
        }
    }

    fn checker<S: MessageHandler<GetInfoResponse>>(
        handler: S,
    ) -> ResponseRewriter<GetInfoRequest, GetInfoResponse, S> {
        ResponseRewriter::response_only("/lnrpc.Lightning/GetInfo", handler, pass_through_errors)
    }

    #[test]
    fn test_type_matching() {
        let c = checker(ClearAlias);
        assert!(c.handles_request("lnrpc.GetInfoRequest"));
        assert!(!c.handles_request("lnrpc.GetInfoResponse"));
        assert!(c.handles_response("lnrpc.GetInfoResponse"));
        assert!(!c.handles_response("lnrpc.FeeReportResponse"));
    }

    #[test]
    fn test_response_only_leaves_request() {
        let c = checker(ClearAlias);
        let result = c
            .handle_request(&CallContext::new(), GetInfoRequest {}.into_rpc())
            .unwrap();
        assert_eq!(result, Transform::NoChange);
    }

    #[test]
    fn test_response_is_rewritten() {
        let c = checker(ClearAlias);
        let resp = GetInfoResponse {
            alias: "alice-node".to_string(),
            ..Default::default()
        };

        match c.handle_response(&CallContext::new(), resp.into_rpc()).unwrap() {
            Transform::Replacement(RpcMessage::GetInfoResponse(r)) => assert!(r.alias.is_empty()),
            other => panic!("unexpected transform {:?}", other),
        }
    }

    #[test]
    fn test_mistyped_message_rejected() {
        let c = checker(ClearAlias);
        let err = c
            .handle_response(&CallContext::new(), GetInfoRequest {}.into_rpc())
            .unwrap_err();
        assert!(matches!(err, MapperError::TypeMismatch { phase: "response", .. }));
    }

    #[test]
    fn test_errors_pass_through() {
        let c = checker(Failing);
        let err = c
            .handle_response(&CallContext::new(), GetInfoResponse::default().into_rpc())
            .unwrap_err();
        assert!(matches!(err, MapperError::StoreFailure(_)));
    }
}
