//! Environment-encoded session store
//!
//! Reads the session from `SESSION_DATA` at startup. The process cannot
//! change its own deployment configuration, so `save` hands the encoded
//! value to the operator instead of writing it anywhere.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use courier_application::ports::operator_notifier::{OperatorNotice, OperatorNotifier};
use courier_domain::{PersistenceMode, Session, SessionId, SessionStore, SessionStoreError};
use tracing::warn;

use super::codec::{decode_env, encode_env};

/// Configuration key holding the encoded session
pub const SESSION_DATA_VAR: &str = "SESSION_DATA";

pub struct EnvSessionStore {
    id: SessionId,
    /// Latest encoded value; starts as the configured `SESSION_DATA`
    encoded: Mutex<Option<String>>,
    notifier: Arc<dyn OperatorNotifier>,
}

impl EnvSessionStore {
    pub fn new(id: SessionId, encoded: Option<String>, notifier: Arc<dyn OperatorNotifier>) -> Self {
        let encoded = encoded.filter(|value| !value.trim().is_empty());
        Self {
            id,
            encoded: Mutex::new(encoded),
            notifier,
        }
    }

    fn current(&self) -> Option<String> {
        self.encoded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, value: Option<String>) {
        *self.encoded.lock().unwrap_or_else(PoisonError::into_inner) = value;
    }
}

#[async_trait]
impl SessionStore for EnvSessionStore {
    fn session_id(&self) -> &SessionId {
        &self.id
    }

    fn persistence(&self) -> PersistenceMode {
        PersistenceMode::Manual
    }

    async fn load(&self) -> Option<Session> {
        let encoded = self.current()?;
        match decode_env(&encoded, &self.id) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(variable = SESSION_DATA_VAR, error = %e, "Ignoring malformed session data");
                None
            }
        }
    }

    async fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        let encoded = encode_env(session)?;
        self.replace(Some(encoded.clone()));

        warn!(
            variable = SESSION_DATA_VAR,
            "Session changed; update {SESSION_DATA_VAR} to keep it across restarts"
        );
        self.notifier.notify(&OperatorNotice::PersistSession {
            variable: SESSION_DATA_VAR,
            encoded,
        });
        Ok(())
    }

    async fn delete(&self, _id: &SessionId) -> Result<(), SessionStoreError> {
        self.replace(None);
        self.notifier.notify(&OperatorNotice::ClearSession {
            variable: SESSION_DATA_VAR,
        });
        Ok(())
    }
}
