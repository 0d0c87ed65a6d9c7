//! In-memory session store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::domain::foundation::{DomainError, SessionId};
use crate::domain::intake::{IntakeSession, SessionStatus};
use crate::ports::{SessionKey, SessionStore};

/// Session store backed by a `HashMap`.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, IntakeSession>>>,
    fail_next: Arc<AtomicBool>,
    fail_next_save: Arc<AtomicBool>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next operation fail with a storage error.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Makes the next `save` fail with a storage error; reads keep working.
    pub fn fail_next_save(&self) {
        self.fail_next_save.store(true, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_injected_failure(&self) -> Result<(), DomainError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(DomainError::storage("injected session store failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, session: &IntakeSession) -> Result<(), DomainError> {
        self.check_injected_failure()?;
        if self.fail_next_save.swap(false, Ordering::SeqCst) {
            return Err(DomainError::storage("injected session save failure"));
        }
        self.sessions
            .write()
            .unwrap()
            .insert(session.id(), session.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: SessionId) -> Result<Option<IntakeSession>, DomainError> {
        self.check_injected_failure()?;
        Ok(self.sessions.read().unwrap().get(&id).cloned())
    }

    async fn find_active(&self, key: &SessionKey) -> Result<Vec<IntakeSession>, DomainError> {
        self.check_injected_failure()?;
        let sessions = self.sessions.read().unwrap();
        Ok(sessions
            .values()
            .filter(|s| s.status() == SessionStatus::Active && &SessionKey::for_session(s) == key)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: SessionId) -> Result<(), DomainError> {
        self.check_injected_failure()?;
        self.sessions.write().unwrap().remove(&id);
        Ok(())
    }
}
