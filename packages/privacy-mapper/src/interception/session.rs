// packages/privacy-mapper/src/interception/session.rs
//! Session identity derived from the call's credential
//!
//! A session ID is only ever used as the scope key of the mapping store.

use crate::utils::errors::{MapperError, Result};
use std::fmt;

/// Length of a session ID in bytes
pub const SESSION_ID_LEN: usize = 4;

/// Opaque session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId([u8; SESSION_ID_LEN]);

impl SessionId {
    pub const fn new(bytes: [u8; SESSION_ID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SESSION_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Derives a session ID from an opaque credential
pub trait SessionIdSource: Send + Sync {
    fn session_id(&self, credential: &[u8]) -> Result<SessionId>;
}

/// Uses the leading bytes of the credential's root key ID as the session ID
#[derive(Debug, Default, Clone, Copy)]
pub struct RootKeyPrefix;

impl SessionIdSource for RootKeyPrefix {
    fn session_id(&self, credential: &[u8]) -> Result<SessionId> {
        if credential.is_empty() {
            return Err(MapperError::InvalidCredential("credential missing".to_string()));
        }

        let prefix: [u8; SESSION_ID_LEN] = credential
            .get(..SESSION_ID_LEN)
            .and_then(|p| p.try_into().ok())
            .ok_or_else(|| {
                MapperError::InvalidCredential(format!(
                    "root key ID too short: {} bytes",
                    credential.len()
                ))
            })?;

        Ok(SessionId(prefix))
    }
}
