// packages/privacy-mapper/src/utils/errors.rs
//! Error types for the privacy mapper
//!
//! Every transformer error propagates unchanged to the dispatcher, which turns
//! it into a rejection of the intercepted call.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, MapperError>;

/// Privacy mapper errors
#[derive(Debug, Error)]
pub enum MapperError {
    /// The method has no registered checker (default-deny)
    #[error("this RPC call is not supported by the privacy mapper interceptor")]
    UnsupportedMethod,

    /// Stream authentication events are never rewritten
    #[error("streams unsupported")]
    StreamsUnsupported,

    /// Payload could not be decoded as its declared type
    #[error("error parsing proto: {0}")]
    MalformedMessage(String),

    /// A registered checker does not accept the message it was handed
    #[error(
        "invalid implementation, checker for URI {method} does not accept \
         {phase} of type {actual}"
    )]
    TypeMismatch {
        method: String,
        phase: &'static str,
        actual: String,
    },

    /// The mapping store transaction failed
    #[error("privacy map store failure: {0}")]
    StoreFailure(String),

    /// A pseudonym has no real value in this session's scope
    #[error("no real value found for pseudonym {0}")]
    PseudonymNotFound(String),

    /// A fuzz parameter lies outside its allowed bounds
    #[error("{0}")]
    ParameterOutOfRange(String),

    /// The entropy source failed to produce a value
    #[error("random source failure: {0}")]
    RandomSourceFailure(String),

    /// The call was cancelled while in flight
    #[error("call cancelled")]
    Cancelled,

    /// No session ID could be derived from the credential
    #[error("could not extract session ID from credential: {0}")]
    InvalidCredential(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl MapperError {
    /// Short label used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            MapperError::UnsupportedMethod => "unsupported_method",
            MapperError::StreamsUnsupported => "streams_unsupported",
            MapperError::MalformedMessage(_) => "malformed_message",
            MapperError::TypeMismatch { .. } => "type_mismatch",
            MapperError::StoreFailure(_) => "store_failure",
            MapperError::PseudonymNotFound(_) => "pseudonym_not_found",
            MapperError::ParameterOutOfRange(_) => "parameter_out_of_range",
            MapperError::RandomSourceFailure(_) => "random_source_failure",
            MapperError::Cancelled => "cancelled",
            MapperError::InvalidCredential(_) => "invalid_credential",
            MapperError::ConfigError(_) => "config_error",
        }
    }
}

impl From<prost::DecodeError> for MapperError {
    fn from(err: prost::DecodeError) -> Self {
        MapperError::MalformedMessage(err.to_string())
    }
}

impl From<config::ConfigError> for MapperError {
    fn from(err: config::ConfigError) -> Self {
        MapperError::ConfigError(err.to_string())
    }
}
