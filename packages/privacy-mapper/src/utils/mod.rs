// packages/privacy-mapper/src/utils/mod.rs
//! Common utilities
//!
//! - **errors**: Error taxonomy shared by every layer
//! - **config**: Process configuration (logging, metrics, randomness)

pub mod config;
pub mod errors;

pub use config::MapperConfig;
pub use errors::{MapperError, Result};
