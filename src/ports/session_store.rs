//! Session store port.
//!
//! Sessions are keyed by (tenant, channel, external id). The store itself
//! is dumb persistence; the conversation store in the application layer
//! owns the at-most-one-active-session invariant and the inactivity reset.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, SessionId, TenantId};
use crate::domain::intake::{Channel, IntakeSession};

/// Identity of a conversation endpoint within a tenant.
///
/// For voice and SMS the external id is the caller's phone number; for web
/// chat it is the widget's visitor id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub tenant_id: TenantId,
    pub channel: Channel,
    pub external_id: String,
}

impl SessionKey {
    pub fn new(tenant_id: TenantId, channel: Channel, external_id: impl Into<String>) -> Self {
        Self {
            tenant_id,
            channel,
            external_id: external_id.into(),
        }
    }

    pub fn for_session(session: &IntakeSession) -> Self {
        Self {
            tenant_id: session.tenant_id().clone(),
            channel: session.channel(),
            external_id: session.external_id().to_string(),
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.tenant_id.as_str(),
            self.channel,
            self.external_id
        )
    }
}

/// Persistence port for intake sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Inserts or updates a session.
    ///
    /// # Errors
    ///
    /// - `StorageError` on persistence failure
    async fn save(&self, session: &IntakeSession) -> Result<(), DomainError>;

    /// Finds a session by id.
    async fn find_by_id(&self, id: SessionId) -> Result<Option<IntakeSession>, DomainError>;

    /// All active sessions for a key.
    ///
    /// A healthy store holds at most one; the caller resolves duplicates.
    async fn find_active(&self, key: &SessionKey) -> Result<Vec<IntakeSession>, DomainError>;

    /// Deletes a session. No-op if absent.
    async fn delete(&self, id: SessionId) -> Result<(), DomainError>;
}
