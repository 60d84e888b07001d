// packages/privacy-mapper/src/rpc/mod.rs
//! Intercepted RPC messages
//!
//! - **lnrpc**: Protobuf messages of the rewritten methods
//! - **wire**: Tagged message variant and decoding by declared type name
//! - **methods**: Fully-qualified method identifiers

pub mod lnrpc;
pub mod methods;
pub mod wire;

pub use wire::{parse_message, RpcMessage, WireMessage};
