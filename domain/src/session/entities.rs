//! Session domain entities

use crate::core::error::DomainError;
use chrono::{DateTime, Utc};
use std::fmt;

/// Retain only `[A-Za-z0-9_-]` from a raw identifier.
///
/// The result is stable under repeated application:
/// `sanitize(&sanitize(x)) == sanitize(x)`.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Identifier a session is stored under (Value Object)
///
/// Always non-empty and restricted to `[A-Za-z0-9_-]`, which makes it safe
/// to use as a directory name or a key-value key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    /// Sanitize a raw configured identifier.
    ///
    /// Fails when nothing survives sanitization.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let clean = sanitize(raw);
        if clean.is_empty() {
            return Err(DomainError::EmptySessionId {
                raw: raw.to_string(),
            });
        }
        Ok(Self(clean))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Authentication state issued by the messaging platform (Entity)
///
/// The payload is opaque to the bot. A session is never merged: every
/// session-update from the platform produces a new `Session` that replaces
/// the previous one wholesale.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    payload: Vec<u8>,
    updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a session stamped with the current time
    pub fn new(id: SessionId, payload: Vec<u8>) -> Self {
        Self::restore(id, payload, Utc::now())
    }

    /// Rebuild a session read back from storage
    pub fn restore(id: SessionId, payload: Vec<u8>, updated_at: DateTime<Utc>) -> Self {
        Self {
            id,
            payload,
            updated_at,
        }
    }

    /// Produce the session that supersedes this one
    pub fn replaced_by(&self, payload: Vec<u8>) -> Self {
        Self::new(self.id.clone(), payload)
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

// Payload holds credentials; keep it out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("payload_len", &self.payload.len())
            .field("updated_at", &self.updated_at)
            .finish()
    }
}
