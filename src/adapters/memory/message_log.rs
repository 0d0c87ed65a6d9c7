//! In-memory message log.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::domain::foundation::{DomainError, SessionId};
use crate::ports::{MessageLog, MessageRecord};

/// Append-only log backed by a `Vec`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageLog {
    records: Arc<RwLock<Vec<MessageRecord>>>,
}

impl InMemoryMessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MessageLog for InMemoryMessageLog {
    async fn append(&self, record: MessageRecord) -> Result<(), DomainError> {
        self.records.write().unwrap().push(record);
        Ok(())
    }

    async fn for_session(&self, session_id: SessionId) -> Result<Vec<MessageRecord>, DomainError> {
        Ok(self
            .records
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::TenantId;
    use crate::domain::intake::HistoryRole;

    #[tokio::test]
    async fn appends_and_filters_by_session() {
        let log = InMemoryMessageLog::new();
        let a = SessionId::new();
        let b = SessionId::new();
        let tenant = TenantId::new("t1").unwrap();

        log.append(MessageRecord::new(a, tenant.clone(), HistoryRole::User, "hi"))
            .await
            .unwrap();
        log.append(MessageRecord::new(b, tenant.clone(), HistoryRole::User, "yo"))
            .await
            .unwrap();
        log.append(MessageRecord::new(a, tenant, HistoryRole::Assistant, "hello"))
            .await
            .unwrap();

        let for_a = log.for_session(a).await.unwrap();
        assert_eq!(for_a.len(), 2);
        assert_eq!(for_a[0].content, "hi");
        assert_eq!(for_a[1].content, "hello");
    }
}
