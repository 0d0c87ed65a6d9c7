//! Handle-utterance command - one full conversation turn.
//!
//! Pipeline: acquire the per-key gate, load or create the session, apply
//! the utterance to the state machine, optionally rephrase the reply via
//! the completion provider (cache-first), persist, log. The state machine
//! is the source of truth; the provider and the cache are best-effort and
//! never change what the turn did to the session. A persistence failure
//! answers with the fixed fallback line and leaves the previously saved
//! state untouched, so the caller can simply continue.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, SessionId, TenantId};
use crate::domain::intake::{
    Channel, HistoryRole, IntakeSession, Stage, FALLBACK_REPLY,
};
use crate::ports::{
    CompletionProvider, IntakeForm, IntakeFormRepository, MessageLog, MessageRecord,
    PhrasingRequest, ResponseCache, SessionKey,
};

use super::conversation_store::ConversationStore;
use super::session_gate::SessionGate;

/// One inbound caller utterance.
#[derive(Debug, Clone)]
pub struct HandleUtteranceCommand {
    pub tenant_id: TenantId,
    pub channel: Channel,
    pub external_id: String,
    pub text: String,
}

impl HandleUtteranceCommand {
    fn key(&self) -> SessionKey {
        SessionKey::new(
            self.tenant_id.clone(),
            self.channel,
            self.external_id.clone(),
        )
    }
}

/// What goes back to the telephony/SMS integration.
#[derive(Debug, Clone)]
pub struct UtteranceReply {
    pub session_id: SessionId,
    pub stage: Stage,
    pub reply: String,
    pub end_call: bool,
    pub intake_complete: bool,
    pub crisis_detected: bool,
}

/// Handler for conversation turns.
pub struct HandleUtteranceHandler {
    conversations: ConversationStore,
    gate: SessionGate,
    provider: Arc<dyn CompletionProvider>,
    cache: Arc<dyn ResponseCache>,
    messages: Arc<dyn MessageLog>,
    forms: Arc<dyn IntakeFormRepository>,
    max_utterance_len: usize,
}

impl HandleUtteranceHandler {
    pub fn new(
        conversations: ConversationStore,
        gate: SessionGate,
        provider: Arc<dyn CompletionProvider>,
        cache: Arc<dyn ResponseCache>,
        messages: Arc<dyn MessageLog>,
        forms: Arc<dyn IntakeFormRepository>,
    ) -> Self {
        Self {
            conversations,
            gate,
            provider,
            cache,
            messages,
            forms,
            max_utterance_len: 2000,
        }
    }

    /// Caps inbound utterance length in characters; longer input is
    /// clipped before the state machine sees it.
    pub fn with_max_utterance_len(mut self, max_utterance_len: usize) -> Self {
        self.max_utterance_len = max_utterance_len.max(1);
        self
    }

    /// Opens a conversation: the assistant speaks first.
    ///
    /// Returns the (possibly rephrased) greeting without consuming an
    /// utterance. Calling this for an existing session re-renders the
    /// current stage's prompt, which makes reconnects idempotent.
    pub async fn open(
        &self,
        tenant_id: TenantId,
        channel: Channel,
        external_id: impl Into<String>,
    ) -> Result<UtteranceReply, DomainError> {
        let key = SessionKey::new(tenant_id, channel, external_id.into());
        let guard = self.gate.acquire(&key).await;

        let (session, created) = match self.conversations.get_or_create(&key).await {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "failed to open session");
                return Ok(Self::unreachable_session_reply());
            }
        };
        let prompt = session.next_prompt();
        let reply = self.phrase(&session, &prompt).await;

        if created {
            if let Err(e) = self.conversations.save(&session).await {
                tracing::error!(key = %key, error = %e, "failed to save opened session");
                return Ok(Self::fallback_reply(&session));
            }
        }
        self.log_message(&session, HistoryRole::Assistant, &reply).await;

        drop(guard);
        Ok(UtteranceReply {
            session_id: session.id(),
            stage: session.stage(),
            reply,
            end_call: false,
            intake_complete: false,
            crisis_detected: false,
        })
    }

    /// Applies one utterance and produces the reply.
    pub async fn handle(
        &self,
        cmd: HandleUtteranceCommand,
    ) -> Result<UtteranceReply, DomainError> {
        let key = cmd.key();
        let guard = self.gate.acquire(&key).await;

        // Storage trouble on load degrades the same way a failed save does:
        // the caller hears the fallback line, nothing is written, and the
        // next utterance retries the lookup.
        let (mut session, _created) = match self.conversations.get_or_create(&key).await {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "failed to load session for turn");
                return Ok(Self::unreachable_session_reply());
            }
        };
        let text = clip(&cmd.text, self.max_utterance_len);
        let outcome = session.process_response(text);

        // Simulated escalation: the session is flagged and staff alerting
        // happens through the log pipeline.
        if outcome.crisis_detected {
            tracing::warn!(
                session_id = %session.id(),
                tenant_id = %session.tenant_id().as_str(),
                channel = %session.channel(),
                "crisis language detected, escalating"
            );
        }

        let reply = if outcome.wants_phrasing {
            self.phrase(&session, &outcome.reply).await
        } else {
            outcome.reply.clone()
        };

        // The form must land before the session is marked done; if it
        // doesn't, answer with the fallback and leave the stored session at
        // confirmation so the caller can confirm again.
        if outcome.intake_complete {
            let form = IntakeForm::from_session(&session);
            if let Err(e) = self.forms.save(&form).await {
                tracing::error!(session_id = %session.id(), error = %e, "failed to save intake form");
                return Ok(Self::fallback_reply(&session));
            }
            tracing::info!(
                session_id = %session.id(),
                completion = session.completion_percentage(),
                crisis = session.crisis_flagged(),
                "intake form saved"
            );
        }

        if let Err(e) = self.conversations.save(&session).await {
            tracing::error!(session_id = %session.id(), error = %e, "failed to save session turn");
            return Ok(Self::fallback_reply(&session));
        }

        self.log_message(&session, HistoryRole::User, text).await;
        self.log_message(&session, HistoryRole::Assistant, &reply).await;

        drop(guard);
        if outcome.end_call {
            self.gate.prune();
        }

        Ok(UtteranceReply {
            session_id: session.id(),
            stage: session.stage(),
            reply,
            end_call: outcome.end_call,
            intake_complete: outcome.intake_complete,
            crisis_detected: outcome.crisis_detected,
        })
    }

    /// Rephrases `base` via the cache and the provider. Best-effort: any
    /// failure returns the deterministic text unchanged.
    async fn phrase(&self, session: &IntakeSession, base: &str) -> String {
        let cache_key = format!(
            "{}/{}/{}",
            session.tenant_id().as_str(),
            session.stage(),
            base
        );

        match self.cache.get(&cache_key).await {
            Ok(Some(hit)) => return hit,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(session_id = %session.id(), error = %e, "response cache read failed");
            }
        }

        let request = PhrasingRequest::new(
            base,
            session.stage(),
            session.id(),
            session.tenant_id().clone(),
        )
        .with_history(session.history().to_vec());

        match self.provider.rephrase(request).await {
            Ok(phrased) => {
                if let Err(e) = self.cache.put(&cache_key, &phrased).await {
                    tracing::warn!(session_id = %session.id(), error = %e, "response cache write failed");
                }
                phrased
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %session.id(),
                    error = %e,
                    "completion provider failed, using deterministic reply"
                );
                base.to_string()
            }
        }
    }

    fn fallback_reply(session: &IntakeSession) -> UtteranceReply {
        UtteranceReply {
            session_id: session.id(),
            stage: session.stage(),
            reply: FALLBACK_REPLY.to_string(),
            end_call: false,
            intake_complete: false,
            crisis_detected: false,
        }
    }

    /// Fallback when no session could be loaded at all. The id is fresh
    /// and refers to no stored session; channel adapters only need the
    /// reply text.
    fn unreachable_session_reply() -> UtteranceReply {
        UtteranceReply {
            session_id: SessionId::new(),
            stage: Stage::Greeting,
            reply: FALLBACK_REPLY.to_string(),
            end_call: false,
            intake_complete: false,
            crisis_detected: false,
        }
    }

    async fn log_message(&self, session: &IntakeSession, role: HistoryRole, content: &str) {
        let record = MessageRecord::new(
            session.id(),
            session.tenant_id().clone(),
            role,
            content,
        );
        if let Err(e) = self.messages.append(record).await {
            tracing::warn!(session_id = %session.id(), error = %e, "message log append failed");
        }
    }
}

/// Truncates to at most `max_chars` characters, never splitting a
/// multi-byte character.
fn clip(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
