//! Mock completion provider for testing.
//!
//! Configurable to return scripted phrasings, inject errors, or add
//! latency. With an empty script it echoes the deterministic reply, which
//! is what the fallback path would produce anyway, so integration tests
//! can assert on exact reply text.
//!
//! # Example
//!
//! ```ignore
//! let provider = MockCompletionProvider::new()
//!     .with_reply("Hi there! What brings you in today?")
//!     .with_error(MockError::Unavailable);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{CompletionError, CompletionProvider, PhrasingRequest};

/// A scripted mock response.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this phrasing.
    Success(String),
    /// Fail with this error.
    Error(MockError),
}

/// Error kinds the mock can inject.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited { retry_after_secs: u32 },
    Unavailable,
    AuthenticationFailed,
    Network,
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for CompletionError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => {
                CompletionError::RateLimited { retry_after_secs }
            }
            MockError::Unavailable => CompletionError::Unavailable {
                message: "injected".to_string(),
            },
            MockError::AuthenticationFailed => CompletionError::AuthenticationFailed,
            MockError::Network => CompletionError::Network("injected".to_string()),
            MockError::Timeout { timeout_secs } => CompletionError::Timeout { timeout_secs },
        }
    }
}

/// Mock completion provider.
#[derive(Debug, Clone, Default)]
pub struct MockCompletionProvider {
    /// Scripted replies, consumed in order.
    script: Arc<Mutex<VecDeque<MockReply>>>,
    /// Simulated latency per request.
    delay: Duration,
    /// Requests seen, for verification.
    calls: Arc<Mutex<Vec<PhrasingRequest>>>,
}

impl MockCompletionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful phrasing.
    pub fn with_reply(self, phrasing: impl Into<String>) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(MockReply::Success(phrasing.into()));
        self
    }

    /// Queues an error.
    pub fn with_error(self, err: MockError) -> Self {
        self.script.lock().unwrap().push_back(MockReply::Error(err));
        self
    }

    /// Adds latency to every request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Requests seen so far.
    pub fn calls(&self) -> Vec<PhrasingRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of requests seen so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn rephrase(&self, request: PhrasingRequest) -> Result<String, CompletionError> {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let scripted = self.script.lock().unwrap().pop_front();
        let base_reply = request.base_reply.clone();
        self.calls.lock().unwrap().push(request);

        match scripted {
            Some(MockReply::Success(phrasing)) => Ok(phrasing),
            Some(MockReply::Error(err)) => Err(err.into()),
            // Unscripted: echo the deterministic reply.
            None => Ok(base_reply),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{SessionId, TenantId};
    use crate::domain::intake::Stage;

    fn request(reply: &str) -> PhrasingRequest {
        PhrasingRequest::new(
            reply,
            Stage::Greeting,
            SessionId::new(),
            TenantId::new("t1").unwrap(),
        )
    }

    #[tokio::test]
    async fn scripted_replies_are_consumed_in_order() {
        let provider = MockCompletionProvider::new()
            .with_reply("first")
            .with_reply("second");

        assert_eq!(provider.rephrase(request("x")).await.unwrap(), "first");
        assert_eq!(provider.rephrase(request("x")).await.unwrap(), "second");
    }

    #[tokio::test]
    async fn unscripted_call_echoes_the_base_reply() {
        let provider = MockCompletionProvider::new();
        let result = provider.rephrase(request("hello there")).await.unwrap();
        assert_eq!(result, "hello there");
    }

    #[tokio::test]
    async fn injected_errors_surface() {
        let provider = MockCompletionProvider::new().with_error(MockError::Unavailable);
        let err = provider.rephrase(request("x")).await.unwrap_err();
        assert!(matches!(err, CompletionError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn calls_are_tracked() {
        let provider = MockCompletionProvider::new();
        provider.rephrase(request("a")).await.unwrap();
        provider.rephrase(request("b")).await.unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.calls()[1].base_reply, "b");
    }
}
