//! In-memory intake form repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::foundation::{DomainError, SessionId};
use crate::ports::{IntakeForm, IntakeFormRepository};

/// Form repository backed by a `HashMap`, keyed by session.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIntakeForms {
    forms: Arc<RwLock<HashMap<SessionId, IntakeForm>>>,
}

impl InMemoryIntakeForms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.forms.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl IntakeFormRepository for InMemoryIntakeForms {
    async fn save(&self, form: &IntakeForm) -> Result<(), DomainError> {
        self.forms
            .write()
            .unwrap()
            .insert(form.session_id, form.clone());
        Ok(())
    }

    async fn find_by_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<IntakeForm>, DomainError> {
        Ok(self.forms.read().unwrap().get(&session_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::TenantId;
    use crate::domain::intake::{Channel, IntakeSession};

    #[tokio::test]
    async fn save_overwrites_per_session() {
        let repo = InMemoryIntakeForms::new();
        let mut session = IntakeSession::new(
            TenantId::new("t1").unwrap(),
            Channel::Sms,
            "+15550000000",
            8,
        );
        repo.save(&IntakeForm::from_session(&session)).await.unwrap();

        session.fields_mut().set_first_name("Ann", false);
        repo.save(&IntakeForm::from_session(&session)).await.unwrap();

        assert_eq!(repo.len(), 1);
        let form = repo.find_by_session(session.id()).await.unwrap().unwrap();
        assert_eq!(form.fields.first_name.as_deref(), Some("Ann"));
    }
}
