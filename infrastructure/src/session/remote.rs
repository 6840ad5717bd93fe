//! Remote key-value session store
//!
//! The session envelope is stored under the key `session-<id>` in an
//! external key-value service reached through [`KeyValueClient`].
//! [`HttpKeyValueClient`] speaks a plain REST dialect:
//!
//! | Operation | Request                 | Absent |
//! |-----------|-------------------------|--------|
//! | get       | `GET {base_url}/{key}`  | 404    |
//! | put       | `PUT {base_url}/{key}`  |        |
//! | delete    | `DELETE {base_url}/{key}` | 404 (ignored) |

use std::sync::Arc;

use async_trait::async_trait;
use courier_domain::{Session, SessionId, SessionStore, SessionStoreError};
use tracing::{debug, warn};

use super::codec::{decode_json, encode_json};

/// Key under which the session for `id` is stored
pub fn session_key(id: &SessionId) -> String {
    format!("session-{id}")
}

/// Minimal key-value capability the remote store needs
#[async_trait]
pub trait KeyValueClient: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SessionStoreError>;

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), SessionStoreError>;

    /// Removing a missing key is not an error
    async fn delete(&self, key: &str) -> Result<(), SessionStoreError>;
}

pub struct RemoteKvSessionStore {
    id: SessionId,
    kv: Arc<dyn KeyValueClient>,
}

impl RemoteKvSessionStore {
    pub fn new(id: SessionId, kv: Arc<dyn KeyValueClient>) -> Self {
        Self { id, kv }
    }
}

#[async_trait]
impl SessionStore for RemoteKvSessionStore {
    fn session_id(&self) -> &SessionId {
        &self.id
    }

    async fn load(&self) -> Option<Session> {
        let key = session_key(&self.id);
        let bytes = match self.kv.get(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(key = %key, "No remote session");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Could not fetch remote session");
                return None;
            }
        };

        match decode_json(&bytes, &self.id) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(key = %key, error = %e, "Ignoring malformed remote session");
                None
            }
        }
    }

    async fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        let key = session_key(session.id());
        self.kv.put(&key, encode_json(session)?).await?;
        debug!(key = %key, "Remote session written");
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), SessionStoreError> {
        self.kv.delete(&session_key(id)).await
    }
}

/// REST client for the key-value service
#[cfg(feature = "remote-store")]
pub struct HttpKeyValueClient {
    client: reqwest::Client,
    base_url: String,
}

#[cfg(feature = "remote-store")]
impl HttpKeyValueClient {
    pub fn new(base_url: &str, timeout: std::time::Duration) -> Result<Self, SessionStoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SessionStoreError::Remote(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[cfg(feature = "remote-store")]
fn remote_error(method: &str, key: &str, e: reqwest::Error) -> SessionStoreError {
    if e.is_timeout() {
        return SessionStoreError::Timeout;
    }
    SessionStoreError::Remote(format!("{method} {key} failed: {e}"))
}

#[cfg(feature = "remote-store")]
fn status_error(method: &str, key: &str, status: reqwest::StatusCode) -> SessionStoreError {
    SessionStoreError::Remote(format!(
        "{method} {key}: HTTP {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    ))
}

#[cfg(feature = "remote-store")]
#[async_trait]
impl KeyValueClient for HttpKeyValueClient {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SessionStoreError> {
        let response = self
            .client
            .get(self.url(key))
            .send()
            .await
            .map_err(|e| remote_error("GET", key, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error("GET", key, status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| remote_error("GET", key, e))?;
        Ok(Some(body.to_vec()))
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), SessionStoreError> {
        let response = self
            .client
            .put(self.url(key))
            .header("Content-Type", "application/json")
            .body(value)
            .send()
            .await
            .map_err(|e| remote_error("PUT", key, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error("PUT", key, status));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), SessionStoreError> {
        let response = self
            .client
            .delete(self.url(key))
            .send()
            .await
            .map_err(|e| remote_error("DELETE", key, e))?;

        let status = response.status();
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            return Err(status_error("DELETE", key, status));
        }
        Ok(())
    }
}
