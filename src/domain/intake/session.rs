//! Intake session entity - the persisted state of one conversation.

use serde::{Deserialize, Serialize};

use super::fields::CollectedFields;
use super::intent::{classify_rough_intent, is_exit_intent};
use super::policy::{StagePolicy, FAREWELL_REPLY};
use super::stage::Stage;
use crate::domain::foundation::{SessionId, TenantId, Timestamp};

/// Inbound channel the conversation arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Voice,
    Sms,
    Web,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Voice => "voice",
            Self::Sms => "sms",
            Self::Web => "web",
        };
        write!(f, "{}", s)
    }
}

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Accepting utterances.
    Active,
    /// Intake finished; the form was written.
    Completed,
    /// Ended without completing (exit intent or disclaimer declined).
    Ended,
}

/// Who produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
}

/// One turn in the bounded context window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub content: String,
}

impl HistoryEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::Assistant,
            content: content.into(),
        }
    }
}

/// What one processed utterance did to the session.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Stage before the utterance was applied.
    pub prior_stage: Stage,
    /// Stage after the utterance was applied.
    pub stage: Stage,
    /// Deterministic reply text for this turn.
    pub reply: String,
    /// True when the conversation should end after this reply.
    pub end_call: bool,
    /// True on the turn the finished intake form should be persisted.
    pub intake_complete: bool,
    /// True when the reply may be rephrased by the completion collaborator.
    pub wants_phrasing: bool,
    /// True when this utterance newly raised the crisis flag.
    pub crisis_detected: bool,
}

/// Safety line prepended to the reply on the turn a crisis is detected.
pub const CRISIS_PREAMBLE: &str = "If you are in immediate danger, please hang up and dial 911, \
     or call or text 988 to reach the Suicide and Crisis Lifeline.";

/// The intake conversation entity.
///
/// One active session exists per (tenant, channel, external id); the
/// conversation store enforces that invariant. The session itself owns the
/// stage, the collected fields, a bounded history window, and the timestamps
/// that drive the inactivity reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeSession {
    id: SessionId,
    tenant_id: TenantId,
    channel: Channel,
    external_id: String,
    stage: Stage,
    status: SessionStatus,
    fields: CollectedFields,
    history: Vec<HistoryEntry>,
    history_window: usize,
    is_new_client: bool,
    disclaimer_accepted: Option<bool>,
    crisis_flagged: bool,
    reset_due_to_inactivity: bool,
    revising: bool,
    created_at: Timestamp,
    last_updated_at: Timestamp,
}

impl IntakeSession {
    /// Creates a fresh session at the greeting stage.
    pub fn new(
        tenant_id: TenantId,
        channel: Channel,
        external_id: impl Into<String>,
        history_window: usize,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: SessionId::new(),
            tenant_id,
            channel,
            external_id: external_id.into(),
            stage: Stage::Greeting,
            status: SessionStatus::Active,
            fields: CollectedFields::new(),
            history: Vec::new(),
            history_window,
            is_new_client: false,
            disclaimer_accepted: None,
            crisis_flagged: false,
            reset_due_to_inactivity: false,
            revising: false,
            created_at: now,
            last_updated_at: now,
        }
    }

    // === Accessors ===

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn fields(&self) -> &CollectedFields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut CollectedFields {
        &mut self.fields
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn is_new_client(&self) -> bool {
        self.is_new_client
    }

    pub fn disclaimer_accepted(&self) -> Option<bool> {
        self.disclaimer_accepted
    }

    pub fn crisis_flagged(&self) -> bool {
        self.crisis_flagged
    }

    pub fn reset_due_to_inactivity(&self) -> bool {
        self.reset_due_to_inactivity
    }

    pub fn is_revising(&self) -> bool {
        self.revising
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn last_updated_at(&self) -> Timestamp {
        self.last_updated_at
    }

    /// True while the new-client disclaimer still needs an answer.
    pub fn disclaimer_pending(&self) -> bool {
        self.is_new_client && self.disclaimer_accepted.is_none()
    }

    // === Mutators used by the stage policy ===

    pub(crate) fn set_stage(&mut self, stage: Stage) {
        debug_assert!(
            self.stage.can_transition_to(&stage),
            "invalid stage transition {:?} -> {:?}",
            self.stage,
            stage
        );
        self.stage = stage;
    }

    pub(crate) fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
    }

    pub(crate) fn accept_disclaimer(&mut self) {
        self.disclaimer_accepted = Some(true);
    }

    pub(crate) fn decline_disclaimer(&mut self) {
        self.disclaimer_accepted = Some(false);
        self.status = SessionStatus::Ended;
    }

    pub(crate) fn begin_revision(&mut self) {
        self.revising = true;
    }

    pub fn mark_new_client(&mut self) {
        self.is_new_client = true;
    }

    /// Ends the session without completing it.
    pub fn end(&mut self) {
        self.status = SessionStatus::Ended;
    }

    /// Rewinds the activity clock by `secs`. Intended for tests and for
    /// backfilling imported transcripts.
    pub fn backdate_last_update(&mut self, secs: u64) {
        self.last_updated_at = self.last_updated_at.minus_secs(secs);
    }

    // === Core operations ===

    /// Processes one caller utterance.
    ///
    /// The exit-intent check runs first at any stage; then the utterance is
    /// scanned for crisis signals; then the stage policy extracts fields and
    /// advances the stage. The turn is appended to the bounded history and
    /// `last_updated_at` moves forward.
    pub fn process_response(&mut self, text: &str) -> TurnOutcome {
        let prior_stage = self.stage;

        if self.status != SessionStatus::Active {
            return TurnOutcome {
                prior_stage,
                stage: self.stage,
                reply: FAREWELL_REPLY.to_string(),
                end_call: true,
                intake_complete: false,
                wants_phrasing: false,
                crisis_detected: false,
            };
        }

        if is_exit_intent(text) {
            self.status = SessionStatus::Ended;
            self.stage = Stage::Completion;
            self.push_turn(text, FAREWELL_REPLY);
            return TurnOutcome {
                prior_stage,
                stage: self.stage,
                reply: FAREWELL_REPLY.to_string(),
                end_call: true,
                intake_complete: false,
                wants_phrasing: false,
                crisis_detected: false,
            };
        }

        let intent = classify_rough_intent(text);
        if intent.new_client {
            self.is_new_client = true;
        }
        let crisis_detected = intent.crisis && !self.crisis_flagged;
        if intent.crisis {
            self.crisis_flagged = true;
        }

        let outcome = StagePolicy::apply(self, text);
        let reply = if crisis_detected {
            format!("{} {}", CRISIS_PREAMBLE, outcome.reply)
        } else {
            outcome.reply.clone()
        };

        self.push_turn(text, &reply);

        TurnOutcome {
            prior_stage,
            stage: self.stage,
            reply,
            end_call: outcome.end_call,
            intake_complete: outcome.intake_complete,
            wants_phrasing: outcome.wants_phrasing && !crisis_detected,
            crisis_detected,
        }
    }

    /// The prompt to (re-)ask for the current stage.
    ///
    /// Pure read: repeated calls without an intervening `process_response`
    /// return the same string.
    pub fn next_prompt(&self) -> String {
        StagePolicy::next_prompt(self)
    }

    /// Share of the four required fields (name, email, phone, reason) that
    /// are populated, as a whole percentage. Observability only.
    pub fn completion_percentage(&self) -> u8 {
        let populated = self.fields.required_populated() as u32;
        ((populated * 100 + 2) / 4) as u8
    }

    /// Reverts an uncommitted stage advance after a collaborator failure,
    /// keeping any fields extracted this turn.
    pub fn revert_stage_to(&mut self, stage: Stage) {
        self.stage = stage;
        if let Some(last) = self.history.last() {
            if last.role == HistoryRole::Assistant {
                self.history.pop();
            }
        }
    }

    /// Full reset applied when the session sat idle past the configured
    /// window: stage, fields, and history all clear, and the session is
    /// tagged for observability.
    pub fn reset_for_inactivity(&mut self) {
        self.stage = Stage::Greeting;
        self.fields = CollectedFields::new();
        self.history.clear();
        self.disclaimer_accepted = None;
        self.revising = false;
        self.reset_due_to_inactivity = true;
        self.last_updated_at = Timestamp::now();
    }

    fn push_turn(&mut self, user_text: &str, assistant_text: &str) {
        self.history.push(HistoryEntry::user(user_text));
        self.history.push(HistoryEntry::assistant(assistant_text));
        let window = self.history_window.max(2);
        if self.history.len() > window {
            let drop = self.history.len() - window;
            self.history.drain(..drop);
        }
        self.last_updated_at = Timestamp::now();
    }
}
