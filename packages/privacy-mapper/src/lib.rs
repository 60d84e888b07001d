// packages/privacy-mapper/src/lib.rs
//! Privacy Mapper Library
//!
//! An RPC interceptor that sits between an external client and a Lightning
//! node backend. Outgoing responses have node identities, channel identifiers
//! and channel points replaced by per-session pseudonyms, and amounts,
//! timestamps and flags fuzzed. Incoming requests that reference
//! pseudonyms are translated back to real values.
//!
//! # Architecture
//!
//! - **interception**: event model, sessions, checkers and the interceptor
//! - **rewrite**: per-method handlers and fuzzing primitives
//! - **store**: session-scoped pseudonym mapping store
//! - **rpc**: wire messages of the supported methods
//! - **random**: injectable randomness sources
//! - **observability**: tracing and metrics
//! - **utils**: configuration and errors

// Public module exports
pub mod interception;
pub mod observability;
pub mod random;
pub mod rewrite;
pub mod rpc;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use interception::{CallContext, InterceptEvent, InterceptOutcome, PrivacyMapper, RequestInterceptor};
pub use store::{InMemoryPrivacyStore, PrivacyMapStore};
pub use utils::config::MapperConfig;
pub use utils::errors::{MapperError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
