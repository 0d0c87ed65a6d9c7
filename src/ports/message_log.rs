//! Message log port - append-only transcript of every turn.
//!
//! The session keeps only a bounded history window; the log keeps the
//! whole conversation for compliance review.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, MessageId, SessionId, TenantId, Timestamp};
use crate::domain::intake::HistoryRole;

/// One logged message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: MessageId,
    pub session_id: SessionId,
    pub tenant_id: TenantId,
    pub role: HistoryRole,
    pub content: String,
    pub logged_at: Timestamp,
}

impl MessageRecord {
    pub fn new(
        session_id: SessionId,
        tenant_id: TenantId,
        role: HistoryRole,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            session_id,
            tenant_id,
            role,
            content: content.into(),
            logged_at: Timestamp::now(),
        }
    }
}

/// Append-only message log.
#[async_trait]
pub trait MessageLog: Send + Sync {
    /// Appends one message.
    ///
    /// # Errors
    ///
    /// - `StorageError` on persistence failure
    async fn append(&self, record: MessageRecord) -> Result<(), DomainError>;

    /// All messages for a session, oldest first.
    async fn for_session(&self, session_id: SessionId) -> Result<Vec<MessageRecord>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_log_is_object_safe() {
        fn _accepts_dyn(_log: &dyn MessageLog) {}
    }
}
