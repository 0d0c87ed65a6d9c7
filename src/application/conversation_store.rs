//! Conversation store - session lookup and lifecycle.
//!
//! Owns two invariants the persistence port doesn't:
//!
//! - at most one active session per key: duplicates are resolved
//!   most-recent-wins, with the losers ended in place
//! - the inactivity reset: an active session idle past the configured
//!   window restarts from the greeting with cleared fields and history

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::domain::intake::IntakeSession;
use crate::ports::{SessionKey, SessionStore};

/// Session lookup/creation over a [`SessionStore`].
#[derive(Clone)]
pub struct ConversationStore {
    sessions: Arc<dyn SessionStore>,
    inactivity_window_secs: u64,
    history_window: usize,
}

impl ConversationStore {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        inactivity_window_secs: u64,
        history_window: usize,
    ) -> Self {
        Self {
            sessions,
            inactivity_window_secs,
            history_window,
        }
    }

    /// The active session for `key`, creating one if none exists.
    ///
    /// Returns the session and whether it was created this call. The
    /// returned session is not yet saved; the caller persists it after
    /// applying the turn.
    pub async fn get_or_create(&self, key: &SessionKey) -> Result<(IntakeSession, bool), DomainError> {
        match self.find_active(key).await? {
            Some(mut session) => {
                if session.last_updated_at().idle_secs() > self.inactivity_window_secs {
                    tracing::info!(
                        session_id = %session.id(),
                        key = %key,
                        idle_secs = session.last_updated_at().idle_secs(),
                        "session idle past window, resetting"
                    );
                    session.reset_for_inactivity();
                }
                Ok((session, false))
            }
            None => {
                let session = IntakeSession::new(
                    key.tenant_id.clone(),
                    key.channel,
                    key.external_id.clone(),
                    self.history_window,
                );
                tracing::info!(session_id = %session.id(), key = %key, "created session");
                Ok((session, true))
            }
        }
    }

    /// The single active session for `key`, if any.
    ///
    /// When the store holds duplicates the most recently updated one wins;
    /// the rest are marked ended and written back so the invariant
    /// self-heals.
    pub async fn find_active(&self, key: &SessionKey) -> Result<Option<IntakeSession>, DomainError> {
        let mut active = self.sessions.find_active(key).await?;
        if active.len() <= 1 {
            return Ok(active.pop());
        }

        tracing::warn!(
            key = %key,
            count = active.len(),
            "multiple active sessions for key, keeping most recent"
        );
        active.sort_by_key(|s| s.last_updated_at());
        let winner = active.pop();
        for mut loser in active {
            loser.end();
            self.sessions.save(&loser).await?;
        }
        Ok(winner)
    }

    /// Persists a session.
    pub async fn save(&self, session: &IntakeSession) -> Result<(), DomainError> {
        self.sessions.save(session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySessionStore;
    use crate::domain::foundation::TenantId;
    use crate::domain::intake::{Channel, SessionStatus, Stage};
    use crate::ports::SessionStore as _;

    fn key() -> SessionKey {
        SessionKey::new(TenantId::new("t1").unwrap(), Channel::Voice, "+15551234567")
    }

    fn store_over(backing: InMemorySessionStore) -> ConversationStore {
        ConversationStore::new(Arc::new(backing), 1800, 8)
    }

    #[tokio::test]
    async fn creates_when_absent_and_reuses_when_present() {
        let backing = InMemorySessionStore::new();
        let store = store_over(backing.clone());

        let (session, created) = store.get_or_create(&key()).await.unwrap();
        assert!(created);
        store.save(&session).await.unwrap();

        let (again, created) = store.get_or_create(&key()).await.unwrap();
        assert!(!created);
        assert_eq!(again.id(), session.id());
    }

    #[tokio::test]
    async fn ended_sessions_are_not_reused() {
        let backing = InMemorySessionStore::new();
        let store = store_over(backing.clone());

        let (mut session, _) = store.get_or_create(&key()).await.unwrap();
        session.process_response("goodbye");
        assert_eq!(session.status(), SessionStatus::Ended);
        store.save(&session).await.unwrap();

        let (fresh, created) = store.get_or_create(&key()).await.unwrap();
        assert!(created);
        assert_ne!(fresh.id(), session.id());
    }

    #[tokio::test]
    async fn duplicate_actives_resolve_most_recent_wins() {
        let backing = InMemorySessionStore::new();
        let store = store_over(backing.clone());

        let older = IntakeSession::new(TenantId::new("t1").unwrap(), Channel::Voice, "+15551234567", 8);
        backing.save(&older).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let mut newer = IntakeSession::new(TenantId::new("t1").unwrap(), Channel::Voice, "+15551234567", 8);
        newer.process_response("hello");
        backing.save(&newer).await.unwrap();

        let (winner, created) = store.get_or_create(&key()).await.unwrap();
        assert!(!created);
        assert_eq!(winner.id(), newer.id());

        // The loser was ended in place.
        let loser = backing.find_by_id(older.id()).await.unwrap().unwrap();
        assert_eq!(loser.status(), SessionStatus::Ended);
        assert_eq!(backing.find_active(&key()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn idle_session_resets_to_greeting() {
        let backing = InMemorySessionStore::new();
        let store = ConversationStore::new(Arc::new(backing.clone()), 1800, 8);

        let (mut session, _) = store.get_or_create(&key()).await.unwrap();
        session.process_response("hello");
        session.process_response("anxiety");
        session.backdate_last_update(3600);
        store.save(&session).await.unwrap();

        let (reloaded, created) = store.get_or_create(&key()).await.unwrap();
        assert!(!created);
        assert_eq!(reloaded.id(), session.id());
        assert_eq!(reloaded.stage(), Stage::Greeting);
        assert!(reloaded.fields().reason.is_none());
        assert!(reloaded.history().is_empty());
        assert!(reloaded.reset_due_to_inactivity());
    }

    #[tokio::test]
    async fn recent_session_is_not_reset() {
        let backing = InMemorySessionStore::new();
        let store = store_over(backing.clone());

        let (mut session, _) = store.get_or_create(&key()).await.unwrap();
        session.process_response("hello");
        store.save(&session).await.unwrap();

        let (reloaded, _) = store.get_or_create(&key()).await.unwrap();
        assert_eq!(reloaded.stage(), Stage::ReasonForCall);
        assert!(!reloaded.reset_due_to_inactivity());
    }
}
