//! Session envelope encoding
//!
//! Every backend stores the same JSON envelope:
//!
//! ```json
//! { "id": "mybot", "payload": "<base64>", "updated_at": "2024-05-01T12:00:00Z" }
//! ```
//!
//! The environment backend wraps the envelope once more in base64 so it fits
//! in a single configuration value.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use courier_domain::{Session, SessionId, SessionStoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored session that cannot be used
#[derive(Error, Debug)]
pub enum SessionDecodeError {
    #[error("Session envelope is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Session data is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Stored session belongs to '{found}', expected '{expected}'")]
    IdMismatch { expected: String, found: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionEnvelope {
    id: String,
    payload: String,
    updated_at: DateTime<Utc>,
}

/// Serialize `session` to its JSON envelope
pub fn encode_json(session: &Session) -> Result<Vec<u8>, SessionStoreError> {
    let envelope = SessionEnvelope {
        id: session.id().to_string(),
        payload: STANDARD.encode(session.payload()),
        updated_at: session.updated_at(),
    };
    serde_json::to_vec_pretty(&envelope).map_err(|e| SessionStoreError::Encode(e.to_string()))
}

/// Parse a JSON envelope written for `expected`
pub fn decode_json(bytes: &[u8], expected: &SessionId) -> Result<Session, SessionDecodeError> {
    let envelope: SessionEnvelope = serde_json::from_slice(bytes)?;
    if envelope.id != expected.as_str() {
        return Err(SessionDecodeError::IdMismatch {
            expected: expected.to_string(),
            found: envelope.id,
        });
    }
    let payload = STANDARD.decode(envelope.payload.as_bytes())?;
    Ok(Session::restore(expected.clone(), payload, envelope.updated_at))
}

/// Encode `session` as a single base64 value (for `SESSION_DATA`)
pub fn encode_env(session: &Session) -> Result<String, SessionStoreError> {
    Ok(STANDARD.encode(encode_json(session)?))
}

/// Decode a `SESSION_DATA` value written for `expected`
pub fn decode_env(value: &str, expected: &SessionId) -> Result<Session, SessionDecodeError> {
    let json = STANDARD.decode(value.trim().as_bytes())?;
    decode_json(&json, expected)
}
