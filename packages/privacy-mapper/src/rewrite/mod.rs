// packages/privacy-mapper/src/rewrite/mod.rs
//! Field transformers
//!
//! - **fuzz**: Bounded randomization of amounts, timestamps and flags
//! - **handlers**: Per-method rewrite logic over a session's mapping store
//!
//! # Consistency
//!
//! Fields derived arithmetically from fuzzed primitives are recomputed from
//! the fuzzed values and never randomized on their own:
//!
//! ```text
//! amt_out_msat ──fuzz──▶ amt_out_msat' ─┐
//!                                       ├─▶ amt_in_msat' = amt_out_msat' + fee_msat'
//! fee_msat ─────fuzz──▶ fee_msat' ──────┘        │
//!                                                ▼
//!                                     amt_in' = amt_in_msat' / 1000
//! ```

pub mod fuzz;
pub mod handlers;

pub use fuzz::{hide_amount, hide_bool, hide_timestamp, FuzzParameters};
pub use handlers::{
    HideChannelList, HideFailedUpdates, HideFeeReport, HideForwardingHistory, HideNodeInfo,
    RevealPeerFilter, RevealPolicyScope,
};

use crate::random::RandomSource;
use crate::store::PrivacyMapDb;

/// Everything a handler needs for one dispatch call
///
/// Bound to a single session's store handle and never kept past the call.
#[derive(Clone, Copy)]
pub struct RewriteEnv<'a> {
    pub db: &'a dyn PrivacyMapDb,
    pub random: &'a dyn RandomSource,
    pub fuzz: FuzzParameters,
}

impl<'a> RewriteEnv<'a> {
    pub fn new(db: &'a dyn PrivacyMapDb, random: &'a dyn RandomSource, fuzz: FuzzParameters) -> Self {
        Self { db, random, fuzz }
    }
}
