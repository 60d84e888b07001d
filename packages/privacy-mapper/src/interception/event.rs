// packages/privacy-mapper/src/interception/event.rs
//! Interception events, per-call context and outcomes

use crate::utils::errors::{MapperError, Result};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// An event handed to the interceptor by the host middleware
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum InterceptEvent {
    /// Authentication of a streaming call
    StreamAuth {
        method_full_uri: String,
        #[serde(with = "hex::serde")]
        credential: Vec<u8>,
    },

    /// A request on its way to the backend
    Request(RpcPayload),

    /// A response on its way to the external client
    Response(RpcPayload),
}

/// Message carried by a request or response event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcPayload {
    /// Fully-qualified method, e.g. "/lnrpc.Lightning/GetInfo"
    pub method_full_uri: String,

    /// Fully-qualified protobuf type name of `serialized`
    pub type_name: String,

    /// Protobuf encoding of the message
    #[serde(with = "hex::serde")]
    pub serialized: Vec<u8>,

    /// The original call already failed
    #[serde(default)]
    pub is_error: bool,

    /// Credential the session ID is derived from
    #[serde(with = "hex::serde")]
    pub credential: Vec<u8>,
}

impl InterceptEvent {
    pub fn phase(&self) -> &'static str {
        match self {
            InterceptEvent::StreamAuth { .. } => "stream_auth",
            InterceptEvent::Request(_) => "request",
            InterceptEvent::Response(_) => "response",
        }
    }

    pub fn method(&self) -> &str {
        match self {
            InterceptEvent::StreamAuth { method_full_uri, .. } => method_full_uri,
            InterceptEvent::Request(p) | InterceptEvent::Response(p) => &p.method_full_uri,
        }
    }

    /// Credential the session is derived from
    pub fn credential(&self) -> &[u8] {
        match self {
            InterceptEvent::StreamAuth { credential, .. } => credential,
            InterceptEvent::Request(p) | InterceptEvent::Response(p) => &p.credential,
        }
    }
}

/// Per-call context
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the call to an externally owned cancellation token
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Fail with `Cancelled` once the call has been cancelled
    pub fn ensure_active(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(MapperError::Cancelled);
        }
        Ok(())
    }
}

/// Result of intercepting one event
#[derive(Debug)]
pub enum InterceptOutcome {
    /// Let the message through unchanged
    Accept,

    /// Replace the message with a re-serialized one of the same type
    Replace {
        type_name: String,
        serialized: Vec<u8>,
    },

    /// Reject the call
    Reject(MapperError),
}

impl InterceptOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            InterceptOutcome::Accept => "accept",
            InterceptOutcome::Replace { .. } => "replace",
            InterceptOutcome::Reject(_) => "reject",
        }
    }

    /// JSON rendering used by the line-oriented front end
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            InterceptOutcome::Accept => serde_json::json!({ "outcome": "accept" }),
            InterceptOutcome::Replace {
                type_name,
                serialized,
            } => serde_json::json!({
                "outcome": "replace",
                "type_name": type_name,
                "serialized": hex::encode(serialized),
            }),
            InterceptOutcome::Reject(err) => serde_json::json!({
                "outcome": "reject",
                "kind": err.kind(),
                "error": err.to_string(),
            }),
        }
    }
}
