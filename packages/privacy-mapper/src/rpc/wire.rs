// packages/privacy-mapper/src/rpc/wire.rs
//! Decoding of intercepted payloads by their declared type name
//!
//! The type name on the wire is untrusted input, so this is the one place it
//! is matched against the set of known messages. Past this boundary checkers
//! work with concrete types.
//!
//! Replacements are encoded from the rewritten message followed by any
//! top-level fields of the original payload that the message type does not
//! declare, so fields added upstream after these declarations still reach
//! their destination.

use crate::rpc::lnrpc::*;
use crate::utils::errors::{MapperError, Result};
use prost::encoding::{decode_key, skip_field, DecodeContext};
use prost::Message;

/// A protobuf message with a fixed fully-qualified type name
pub trait WireMessage: Message + Default + Sized + 'static {
    /// Fully-qualified protobuf type name, e.g. "lnrpc.GetInfoResponse"
    const TYPE_NAME: &'static str;

    /// Field tags declared by the message
    const FIELD_TAGS: &'static [u32];

    /// Wrap into the tagged variant
    fn into_rpc(self) -> RpcMessage;

    /// Unwrap from the tagged variant, handing the message back on mismatch
    fn from_rpc(msg: RpcMessage) -> std::result::Result<Self, RpcMessage>;
}

macro_rules! rpc_messages {
    ($($variant:ident => $name:literal [$($tag:literal),*]),* $(,)?) => {
        /// Every message the privacy mapper can decode
        #[derive(Debug, Clone, PartialEq)]
        pub enum RpcMessage {
            $($variant($variant),)*
        }

        impl RpcMessage {
            /// Fully-qualified type name of the wrapped message
            pub fn type_name(&self) -> &'static str {
                match self {
                    $(RpcMessage::$variant(_) => $name,)*
                }
            }

            /// Field tags declared by the wrapped message type
            pub fn field_tags(&self) -> &'static [u32] {
                match self {
                    $(RpcMessage::$variant(_) => <$variant as WireMessage>::FIELD_TAGS,)*
                }
            }

            /// Serialize the wrapped message
            pub fn encode(&self) -> Vec<u8> {
                match self {
                    $(RpcMessage::$variant(m) => m.encode_to_vec(),)*
                }
            }
        }

        $(
            impl WireMessage for $variant {
                const TYPE_NAME: &'static str = $name;
                const FIELD_TAGS: &'static [u32] = &[$($tag),*];

                fn into_rpc(self) -> RpcMessage {
                    RpcMessage::$variant(self)
                }

                fn from_rpc(msg: RpcMessage) -> std::result::Result<Self, RpcMessage> {
                    match msg {
                        RpcMessage::$variant(m) => Ok(m),
                        #[allow(unreachable_patterns)]
                        other => Err(other),
                    }
                }
            }
        )*

        /// Decode `serialized` as the message named `type_name`
        pub fn parse_message(type_name: &str, serialized: &[u8]) -> Result<RpcMessage> {
            match type_name {
                $($name => Ok(RpcMessage::$variant($variant::decode(serialized)?)),)*
                other => Err(MapperError::MalformedMessage(format!(
                    "unknown message type {}",
                    other
                ))),
            }
        }
    };
}

rpc_messages! {
    GetInfoRequest => "lnrpc.GetInfoRequest" [],
    GetInfoResponse => "lnrpc.GetInfoResponse"
        [1, 2, 3, 4, 5, 6, 8, 9, 10, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22],
    ForwardingHistoryRequest => "lnrpc.ForwardingHistoryRequest" [1, 2, 3, 4, 5],
    ForwardingHistoryResponse => "lnrpc.ForwardingHistoryResponse" [1, 2],
    FeeReportRequest => "lnrpc.FeeReportRequest" [],
    FeeReportResponse => "lnrpc.FeeReportResponse" [1, 2, 3, 4],
    ListChannelsRequest => "lnrpc.ListChannelsRequest" [1, 2, 3, 4, 5, 6],
    ListChannelsResponse => "lnrpc.ListChannelsResponse" [11],
    PolicyUpdateRequest => "lnrpc.PolicyUpdateRequest" [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
    PolicyUpdateResponse => "lnrpc.PolicyUpdateResponse" [1],
}

impl RpcMessage {
    /// Encode a rewritten message in place of `original`
    ///
    /// Top-level fields of `original` with tags the type does not declare are
    /// appended unchanged.
    pub fn encode_replacement(&self, original: &[u8]) -> Result<Vec<u8>> {
        let mut out = self.encode();
        out.extend_from_slice(&undeclared_fields(original, self.field_tags())?);
        Ok(out)
    }
}

/// Raw bytes of the top-level fields in `serialized` whose tags are not in `declared`
fn undeclared_fields(serialized: &[u8], declared: &[u32]) -> Result<Vec<u8>> {
    let mut buf = serialized;
    let mut kept = Vec::new();

    while !buf.is_empty() {
        let field_start = buf;
        let (tag, wire_type) = decode_key(&mut buf)?;
        skip_field(wire_type, tag, &mut buf, DecodeContext::default())?;

        if !declared.contains(&tag) {
            let field_len = field_start.len() - buf.len();
            kept.extend_from_slice(&field_start[..field_len]);
        }
    }

    Ok(kept)
}
