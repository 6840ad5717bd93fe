//! Filesystem session store
//!
//! Layout: `<root>/<session-id>/session.json`. Writes go to a temporary
//! file that is then renamed over the previous session, so a crash never
//! leaves a half-written envelope behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use courier_domain::{Session, SessionId, SessionStore, SessionStoreError};
use tracing::{debug, warn};

use super::codec::{decode_json, encode_json};

const SESSION_FILE: &str = "session.json";
const TEMP_FILE: &str = "session.json.tmp";

pub struct LocalSessionStore {
    id: SessionId,
    root: PathBuf,
}

impl LocalSessionStore {
    pub fn new(root: impl Into<PathBuf>, id: SessionId) -> Self {
        Self {
            id,
            root: root.into(),
        }
    }

    /// Directory holding the session for `id`
    fn session_dir(&self, id: &SessionId) -> PathBuf {
        self.root.join(id.as_str())
    }

    pub fn session_path(&self) -> PathBuf {
        self.session_dir(&self.id).join(SESSION_FILE)
    }

    async fn write_atomically(dir: &Path, bytes: &[u8]) -> std::io::Result<()> {
        tokio::fs::create_dir_all(dir).await?;
        let temp = dir.join(TEMP_FILE);
        tokio::fs::write(&temp, bytes).await?;
        tokio::fs::rename(&temp, dir.join(SESSION_FILE)).await
    }
}

#[async_trait]
impl SessionStore for LocalSessionStore {
    fn session_id(&self) -> &SessionId {
        &self.id
    }

    async fn load(&self) -> Option<Session> {
        let path = self.session_path();
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No stored session");
                return None;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read stored session");
                return None;
            }
        };

        match decode_json(&bytes, &self.id) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring malformed stored session");
                None
            }
        }
    }

    async fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        let bytes = encode_json(session)?;
        let dir = self.session_dir(session.id());
        Self::write_atomically(&dir, &bytes).await?;
        debug!(path = %dir.join(SESSION_FILE).display(), "Session written");
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), SessionStoreError> {
        match tokio::fs::remove_dir_all(self.session_dir(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir, id: &str) -> LocalSessionStore {
        LocalSessionStore::new(dir.path(), SessionId::parse(id).unwrap())
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, "mybot");
        let session = Session::new(store.session_id().clone(), b"creds".to_vec());

        store.save(&session).await.unwrap();

        assert!(dir.path().join("mybot").join("session.json").exists());
        assert!(!dir.path().join("mybot").join("session.json.tmp").exists());
        assert_eq!(store.load().await, Some(session));
    }

    #[tokio::test]
    async fn test_save_replaces_previous_session() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, "mybot");
        let first = Session::new(store.session_id().clone(), b"one".to_vec());
        let second = first.replaced_by(b"two".to_vec());

        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();

        assert_eq!(store.load().await.unwrap().payload(), b"two");
    }

    #[tokio::test]
    async fn test_missing_session_is_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(store(&dir, "mybot").load().await, None);
    }

    #[tokio::test]
    async fn test_malformed_session_is_none() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, "mybot");
        std::fs::create_dir_all(dir.path().join("mybot")).unwrap();
        std::fs::write(store.session_path(), b"{ truncated").unwrap();

        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated_by_id() {
        let dir = TempDir::new().unwrap();
        let a = store(&dir, "alpha");
        let b = store(&dir, "beta");
        a.save(&Session::new(a.session_id().clone(), b"a".to_vec()))
            .await
            .unwrap();

        assert!(a.load().await.is_some());
        assert_eq!(b.load().await, None);
    }

    #[tokio::test]
    async fn test_delete_removes_session_and_tolerates_absence() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, "mybot");
        let id = store.session_id().clone();
        store
            .save(&Session::new(id.clone(), b"x".to_vec()))
            .await
            .unwrap();

        store.delete(&id).await.unwrap();
        assert_eq!(store.load().await, None);
        store.delete(&id).await.unwrap();
    }
}
