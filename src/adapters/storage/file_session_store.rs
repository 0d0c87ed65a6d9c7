//! File-backed session store.
//!
//! One JSON file per session under a data directory, named by session id.
//! Writes go through a temp file and rename so a crash mid-write never
//! leaves a torn session on disk. Suited to single-node deployments;
//! `find_active` scans the directory, which is fine at intake-line volume.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::foundation::{DomainError, SessionId};
use crate::domain::intake::{IntakeSession, SessionStatus};
use crate::ports::{SessionKey, SessionStore};

/// Session store writing JSON files under a directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DomainError::storage(format!("create session dir: {}", e)))?;
        Ok(Self { dir })
    }

    fn path_for(&self, id: SessionId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    async fn read_session(path: &Path) -> Result<IntakeSession, DomainError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DomainError::storage(format!("read session file: {}", e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| DomainError::storage(format!("decode session file: {}", e)))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn save(&self, session: &IntakeSession) -> Result<(), DomainError> {
        let json = serde_json::to_vec_pretty(session)
            .map_err(|e| DomainError::storage(format!("encode session: {}", e)))?;

        let path = self.path_for(session.id());
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| DomainError::storage(format!("write session file: {}", e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| DomainError::storage(format!("commit session file: {}", e)))?;
        Ok(())
    }

    async fn find_by_id(&self, id: SessionId) -> Result<Option<IntakeSession>, DomainError> {
        let path = self.path_for(id);
        if !tokio::fs::try_exists(&path)
            .await
            .map_err(|e| DomainError::storage(format!("stat session file: {}", e)))?
        {
            return Ok(None);
        }
        Self::read_session(&path).await.map(Some)
    }

    async fn find_active(&self, key: &SessionKey) -> Result<Vec<IntakeSession>, DomainError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| DomainError::storage(format!("list session dir: {}", e)))?;

        let mut found = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DomainError::storage(format!("list session dir: {}", e)))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let session = Self::read_session(&path).await?;
            if session.status() == SessionStatus::Active && &SessionKey::for_session(&session) == key
            {
                found.push(session);
            }
        }
        Ok(found)
    }

    async fn delete(&self, id: SessionId) -> Result<(), DomainError> {
        let path = self.path_for(id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::storage(format!("delete session file: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::TenantId;
    use crate::domain::intake::Channel;
    use tempfile::tempdir;

    fn session(external_id: &str) -> IntakeSession {
        IntakeSession::new(
            TenantId::new("t1").unwrap(),
            Channel::Voice,
            external_id,
            8,
        )
    }

    #[tokio::test]
    async fn round_trips_a_session_through_disk() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).await.unwrap();

        let mut s = session("+15551234567");
        s.process_response("hello");
        store.save(&s).await.unwrap();

        let loaded = store.find_by_id(s.id()).await.unwrap().unwrap();
        assert_eq!(loaded.id(), s.id());
        assert_eq!(loaded.stage(), s.stage());
        assert_eq!(loaded.history().len(), 2);
    }

    #[tokio::test]
    async fn missing_session_is_none() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).await.unwrap();
        assert!(store.find_by_id(SessionId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_active_scans_by_key() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).await.unwrap();

        let a = session("+15551111111");
        let b = session("+15552222222");
        store.save(&a).await.unwrap();
        store.save(&b).await.unwrap();

        let found = store.find_active(&SessionKey::for_session(&a)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), a.id());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).await.unwrap();

        let s = session("+15551234567");
        store.save(&s).await.unwrap();
        store.delete(s.id()).await.unwrap();
        store.delete(s.id()).await.unwrap();
        assert!(store.find_by_id(s.id()).await.unwrap().is_none());
    }
}
