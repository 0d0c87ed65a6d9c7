//! Intake form repository port.
//!
//! When a session reaches confirmation and the caller says yes, the
//! collected fields are frozen into a form for the practice's intake team.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, SessionId, TenantId, Timestamp};
use crate::domain::intake::{Channel, CollectedFields, IntakeSession};

/// A finished intake form, frozen at confirmation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeForm {
    pub session_id: SessionId,
    pub tenant_id: TenantId,
    pub channel: Channel,
    pub fields: CollectedFields,
    pub is_new_client: bool,
    pub crisis_flagged: bool,
    pub completed_at: Timestamp,
}

impl IntakeForm {
    /// Snapshots a completed session into a form.
    pub fn from_session(session: &IntakeSession) -> Self {
        Self {
            session_id: session.id(),
            tenant_id: session.tenant_id().clone(),
            channel: session.channel(),
            fields: session.fields().clone(),
            is_new_client: session.is_new_client(),
            crisis_flagged: session.crisis_flagged(),
            completed_at: Timestamp::now(),
        }
    }
}

/// Persistence port for finished intake forms.
#[async_trait]
pub trait IntakeFormRepository: Send + Sync {
    /// Saves a form. Saving twice for the same session overwrites.
    ///
    /// # Errors
    ///
    /// - `StorageError` on persistence failure
    async fn save(&self, form: &IntakeForm) -> Result<(), DomainError>;

    /// The form for a session, if one was completed.
    async fn find_by_session(&self, session_id: SessionId)
        -> Result<Option<IntakeForm>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intake_form_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn IntakeFormRepository) {}
    }
}
