//! Session store trait

use super::entities::{Session, SessionId};
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by session store backends
#[derive(Error, Debug)]
pub enum SessionStoreError {
    #[error("Session I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session could not be encoded: {0}")]
    Encode(String),

    #[error("Remote session store error: {0}")]
    Remote(String),

    #[error("Session store timed out")]
    Timeout,
}

/// Whether `save` actually makes a session durable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceMode {
    /// The backend writes the session somewhere that survives a restart.
    Durable,
    /// The backend can only hand the encoded session to the operator, who
    /// must persist it externally (e.g. as a configuration value).
    Manual,
}

/// Persistence backend for authentication sessions
///
/// This is a domain-level abstraction; implementations live in the
/// infrastructure layer. A store is bound to a single [`SessionId`].
///
/// `load` never fails: a missing or malformed stored session is reported as
/// `None` (and logged by the backend) so that the caller falls back to a
/// fresh authentication.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The identifier this store reads and writes
    fn session_id(&self) -> &SessionId;

    /// Describe whether `save` is durable
    fn persistence(&self) -> PersistenceMode {
        PersistenceMode::Durable
    }

    /// Restore the stored session, if one exists and decodes
    async fn load(&self) -> Option<Session>;

    /// Persist `session`, replacing whatever was stored before
    async fn save(&self, session: &Session) -> Result<(), SessionStoreError>;

    /// Remove the stored session for `id`
    async fn delete(&self, id: &SessionId) -> Result<(), SessionStoreError>;
}
