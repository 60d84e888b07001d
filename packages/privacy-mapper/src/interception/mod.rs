// packages/privacy-mapper/src/interception/mod.rs
//! Request interception layer
//!
//! - **Event**: interception events, per-call context and outcomes
//! - **Session**: session IDs derived from call credentials
//! - **Checker**: type-checked request/response rewriters
//! - **Registry**: method to rewriter table
//! - **Privacy Mapper**: the interceptor itself
//!
//! # Architecture
//!
//! ```text
//! Host middleware
//!     │
//!     ├─ StreamAuth ─────────────────────────→ Reject
//!     ├─ Request  ─┐
//!     └─ Response ─┴→ Session → Parse → Registry → Checker → Accept / Replace / Reject
//! ```

pub mod checker;
pub mod event;
pub mod privacy_mapper;
pub mod registry;
pub mod session;

// Re-export commonly used types
pub use checker::{RoundTripChecker, Transform};
pub use event::{CallContext, InterceptEvent, InterceptOutcome, RpcPayload};
pub use privacy_mapper::{PrivacyMapper, RequestInterceptor};
pub use session::{RootKeyPrefix, SessionId, SessionIdSource};
