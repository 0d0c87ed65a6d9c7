//! Completion provider port - the language-model collaborator.
//!
//! The state machine, extraction, and stage transitions are all
//! deterministic; the provider's only job is to rephrase a
//! deterministically-chosen reply so it reads naturally. A provider
//! failure must never lose session state, so callers fall back to the
//! fixed reply and leave the session resumable.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{SessionId, TenantId};
use crate::domain::intake::{HistoryEntry, Stage};

/// Request to rephrase a deterministic reply.
#[derive(Debug, Clone)]
pub struct PhrasingRequest {
    /// The reply the state machine chose. The rephrasing must preserve its
    /// meaning and any question it asks.
    pub base_reply: String,
    /// Stage the conversation is in, for tone.
    pub stage: Stage,
    /// Recent turns for conversational continuity.
    pub history: Vec<HistoryEntry>,
    /// Per-tenant practice name or style notes injected into the prompt.
    pub tenant_style: Option<String>,
    /// Session and tenant, for tracing.
    pub session_id: SessionId,
    pub tenant_id: TenantId,
}

impl PhrasingRequest {
    pub fn new(
        base_reply: impl Into<String>,
        stage: Stage,
        session_id: SessionId,
        tenant_id: TenantId,
    ) -> Self {
        Self {
            base_reply: base_reply.into(),
            stage,
            history: Vec::new(),
            tenant_style: None,
            session_id,
            tenant_id,
        }
    }

    pub fn with_history(mut self, history: Vec<HistoryEntry>) -> Self {
        self.history = history;
        self
    }

    pub fn with_tenant_style(mut self, style: impl Into<String>) -> Self {
        self.tenant_style = Some(style.into());
        self
    }
}

/// Errors from the completion collaborator.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Rate limited by the provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// Provider is down or returned a server error.
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    /// API key rejected.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during the request.
    #[error("network error: {0}")]
    Network(String),

    /// Provider responded with something we couldn't parse.
    #[error("parse error: {0}")]
    Parse(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

impl CompletionError {
    /// True for transient failures where an immediate retry may succeed.
    ///
    /// Rate limiting is deliberately not retryable here: honoring
    /// `retry_after_secs` takes longer than a caller waiting on a voice
    /// turn can afford.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable { .. } | Self::Network(_) | Self::Timeout { .. }
        )
    }
}

/// Port for the reply-phrasing collaborator.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Rephrases `request.base_reply` for warmth.
    ///
    /// # Errors
    ///
    /// Any [`CompletionError`]; callers must treat every variant as
    /// "use the deterministic reply instead".
    async fn rephrase(&self, request: PhrasingRequest) -> Result<String, CompletionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_provider_is_object_safe() {
        fn _accepts_dyn(_provider: &dyn CompletionProvider) {}
    }

    #[test]
    fn errors_render_with_context() {
        let err = CompletionError::RateLimited {
            retry_after_secs: 30,
        };
        assert_eq!(err.to_string(), "rate limited: retry after 30s");
    }

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(CompletionError::Network("reset".into()).is_retryable());
        assert!(CompletionError::Timeout { timeout_secs: 10 }.is_retryable());
        assert!(CompletionError::Unavailable {
            message: "503".into()
        }
        .is_retryable());

        assert!(!CompletionError::AuthenticationFailed.is_retryable());
        assert!(!CompletionError::Parse("bad json".into()).is_retryable());
        assert!(!CompletionError::RateLimited {
            retry_after_secs: 30
        }
        .is_retryable());
    }
}
