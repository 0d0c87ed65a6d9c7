//! End-to-end intake conversations through the full handler stack.

use std::sync::Arc;
use std::time::Duration;

use practice_intake::adapters::ai::{MockCompletionProvider, MockError};
use practice_intake::adapters::memory::{
    InMemoryIntakeForms, InMemoryMessageLog, InMemoryResponseCache, InMemorySessionStore,
};
use practice_intake::application::{
    ConversationStore, HandleUtteranceCommand, HandleUtteranceHandler, SessionGate,
};
use practice_intake::domain::foundation::TenantId;
use practice_intake::domain::intake::{Channel, Insurance, SessionStatus, Stage, CRISIS_PREAMBLE};
use practice_intake::ports::{IntakeFormRepository, MessageLog, SessionStore};

struct Harness {
    handler: Arc<HandleUtteranceHandler>,
    sessions: InMemorySessionStore,
    messages: InMemoryMessageLog,
    forms: InMemoryIntakeForms,
}

impl Harness {
    fn new() -> Self {
        Self::with_provider(MockCompletionProvider::new())
    }

    fn with_provider(provider: MockCompletionProvider) -> Self {
        let sessions = InMemorySessionStore::new();
        let messages = InMemoryMessageLog::new();
        let forms = InMemoryIntakeForms::new();
        let handler = HandleUtteranceHandler::new(
            ConversationStore::new(Arc::new(sessions.clone()), 1800, 12),
            SessionGate::new(),
            Arc::new(provider),
            Arc::new(InMemoryResponseCache::new(Duration::from_secs(300))),
            Arc::new(messages.clone()),
            Arc::new(forms.clone()),
        );
        Self {
            handler: Arc::new(handler),
            sessions,
            messages,
            forms,
        }
    }

    fn cmd(&self, text: &str) -> HandleUtteranceCommand {
        HandleUtteranceCommand {
            tenant_id: TenantId::new("willow-creek").unwrap(),
            channel: Channel::Voice,
            external_id: "+15551234567".to_string(),
            text: text.to_string(),
        }
    }

    async fn say(&self, text: &str) -> practice_intake::application::UtteranceReply {
        self.handler.handle(self.cmd(text)).await.unwrap()
    }
}

#[tokio::test]
async fn happy_path_individual_intake_produces_a_form() {
    let h = Harness::new();

    let opening = h
        .handler
        .open(
            TenantId::new("willow-creek").unwrap(),
            Channel::Voice,
            "+15551234567",
        )
        .await
        .unwrap();
    assert_eq!(opening.stage, Stage::Greeting);

    h.say("hi there").await;
    h.say("I've been dealing with a lot of anxiety").await;
    h.say("just for me, individual").await;
    h.say("my name is John Smith").await;
    h.say("john.smith@example.com").await;
    h.say("555-867-5309").await;
    h.say("Illinois").await;
    h.say("I have blue cross").await;
    let summary = h.say("weekday evenings after work").await;

    assert_eq!(summary.stage, Stage::Confirmation);
    assert!(summary.reply.contains("John Smith"));
    assert!(summary.reply.contains("john.smith@example.com"));
    assert!(summary.reply.contains("Blue Cross Blue Shield"));
    assert!(summary.reply.ends_with("Did I get everything right?"));

    let done = h.say("yes, everything is correct").await;
    assert!(done.end_call);
    assert!(done.intake_complete);

    let form = h
        .forms
        .find_by_session(done.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(form.fields.full_name().as_deref(), Some("John Smith"));
    assert_eq!(form.fields.phone.as_deref(), Some("555-867-5309"));
    assert_eq!(form.fields.state.as_deref(), Some("Illinois"));
    assert_eq!(
        form.fields.insurance,
        Some(Insurance::Carrier("Blue Cross Blue Shield".to_string()))
    );
    assert!(!form.crisis_flagged);
}

#[tokio::test]
async fn crisis_language_flags_the_session_and_prepends_safety_info() {
    let h = Harness::new();

    h.say("hello").await;
    let reply = h.say("honestly I've been having thoughts of suicide").await;

    assert!(reply.crisis_detected);
    assert!(reply.reply.starts_with(CRISIS_PREAMBLE));

    // The flag follows the session through to the form.
    h.say("individual").await;
    h.say("my name is Dana Cho").await;
    h.say("dana@example.com").await;
    h.say("555-111-2222").await;
    h.say("Oregon").await;
    h.say("self pay").await;
    h.say("mornings, any day").await;
    let done = h.say("yes").await;

    let form = h
        .forms
        .find_by_session(done.session_id)
        .await
        .unwrap()
        .unwrap();
    assert!(form.crisis_flagged);
}

#[tokio::test]
async fn new_client_must_answer_the_disclaimer_before_intake_continues() {
    let h = Harness::new();

    h.say("hi, I'm a new patient").await;
    let gate = h.say("I'd like to start therapy").await;
    assert!(gate.reply.contains("automated intake assistant"));
    assert_eq!(gate.stage, Stage::ReasonForCall);

    // An ambiguous answer re-asks instead of advancing.
    let clarify = h.say("um, who is this?").await;
    assert_eq!(clarify.stage, Stage::ReasonForCall);
    assert!(clarify.reply.contains("yes or no"));

    let accepted = h.say("yes that's fine").await;
    assert_eq!(accepted.stage, Stage::ContactInfo);
}

#[tokio::test]
async fn declined_disclaimer_ends_the_conversation() {
    let h = Harness::new();

    h.say("hello, first time caller").await;
    h.say("looking for couples counseling").await;
    let declined = h.say("no, I'd rather not").await;

    assert!(declined.end_call);
    let stored = h
        .sessions
        .find_by_id(declined.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status(), SessionStatus::Ended);
}

#[tokio::test]
async fn idle_session_restarts_from_the_greeting() {
    let h = Harness::new();

    h.say("hello").await;
    let mid = h.say("feeling burned out at work").await;
    assert_eq!(mid.stage, Stage::ContactInfo);

    // Simulate the caller coming back 31+ minutes later.
    let mut stored = h
        .sessions
        .find_by_id(mid.session_id)
        .await
        .unwrap()
        .unwrap();
    stored.backdate_last_update(1900);
    h.sessions.save(&stored).await.unwrap();

    let resumed = h.say("hello again").await;
    assert_eq!(resumed.session_id, mid.session_id);
    assert_eq!(resumed.stage, Stage::ReasonForCall);

    let reloaded = h
        .sessions
        .find_by_id(mid.session_id)
        .await
        .unwrap()
        .unwrap();
    assert!(reloaded.reset_due_to_inactivity());
    assert!(reloaded.fields().reason.is_none());
}

#[tokio::test]
async fn rejected_confirmation_allows_corrections_without_losing_fields() {
    let h = Harness::new();

    h.say("hello").await;
    h.say("stress and sleep trouble").await;
    h.say("individual").await;
    h.say("my name is Ann Lee").await;
    h.say("ann@example.com").await;
    h.say("555-123-4567").await;
    h.say("Ohio").await;
    h.say("cigna").await;
    let summary = h.say("fridays, afternoons").await;
    assert_eq!(summary.stage, Stage::Confirmation);

    let rejected = h.say("no, that's not right").await;
    assert_eq!(rejected.stage, Stage::ContactInfo);

    let corrected = h.say("my email is ann.lee@example.org").await;
    assert_eq!(corrected.stage, Stage::Confirmation);
    assert!(corrected.reply.contains("ann.lee@example.org"));
    // Untouched fields survived the correction pass.
    assert!(corrected.reply.contains("555-123-4567"));
    assert!(corrected.reply.contains("Cigna"));

    let done = h.say("yes, perfect").await;
    assert!(done.intake_complete);
    let form = h
        .forms
        .find_by_session(done.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(form.fields.email.as_deref(), Some("ann.lee@example.org"));
}

#[tokio::test]
async fn rejected_confirmation_accepts_name_and_state_corrections() {
    let h = Harness::new();

    h.say("hello").await;
    h.say("stress and sleep trouble").await;
    h.say("individual").await;
    h.say("my name is Ann Lee").await;
    h.say("ann@example.com").await;
    h.say("555-123-4567").await;
    h.say("Ohio").await;
    h.say("cigna").await;
    h.say("fridays, afternoons").await;

    h.say("no, that's not right").await;
    let fixed_state = h.say("Michigan").await;
    assert_eq!(fixed_state.stage, Stage::Confirmation);
    assert!(fixed_state.reply.contains("State: Michigan"));

    h.say("no, one more thing").await;
    let fixed_name = h.say("my name is Anna Leigh").await;
    assert!(fixed_name.reply.contains("Name: Anna Leigh"));

    let done = h.say("yes, perfect").await;
    assert!(done.intake_complete);
    let form = h
        .forms
        .find_by_session(done.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(form.fields.state.as_deref(), Some("Michigan"));
    assert_eq!(form.fields.full_name().as_deref(), Some("Anna Leigh"));
}

#[tokio::test]
async fn exit_intent_ends_politely_at_any_point() {
    let h = Harness::new();

    h.say("hello").await;
    h.say("anxiety").await;
    h.say("individual").await;
    let bye = h.say("sorry, I've gotta go").await;

    assert!(bye.end_call);
    assert!(bye.reply.contains("call or text back anytime"));

    let stored = h
        .sessions
        .find_by_id(bye.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status(), SessionStatus::Ended);
    // Partial answers are retained for when they call back.
    assert_eq!(
        stored.fields().reason.as_deref(),
        Some("anxiety")
    );
}

#[tokio::test]
async fn provider_outage_mid_conversation_degrades_to_deterministic_replies() {
    let h = Harness::with_provider(
        MockCompletionProvider::new()
            .with_reply("Hello! So, what's bringing you in?")
            .with_error(MockError::Timeout { timeout_secs: 10 }),
    );

    let greeted = h.say("hello").await;
    assert_eq!(greeted.reply, "Hello! So, what's bringing you in?");

    // The scripted error hits the next phrased reply; the turn still lands.
    let reply = h.say("feeling low lately").await;
    assert_eq!(reply.stage, Stage::ContactInfo);
    assert!(reply.reply.contains("individual counseling"));

    let stored = h
        .sessions
        .find_by_id(reply.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.stage(), Stage::ContactInfo);
    assert_eq!(stored.fields().reason.as_deref(), Some("feeling low lately"));
}

#[tokio::test]
async fn concurrent_turns_for_one_caller_are_applied_in_full() {
    let h = Harness::new();
    h.say("hello").await;
    h.say("anxiety").await;

    // Fire several turns at once for the same caller; the gate serializes
    // them so every turn is applied to a consistent session.
    let mut handles = Vec::new();
    for text in ["individual", "my name is Ann Lee", "ann@example.com"] {
        let handler = Arc::clone(&h.handler);
        let cmd = h.cmd(text);
        handles.push(tokio::spawn(async move { handler.handle(cmd).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let active = h
        .sessions
        .find_active(&practice_intake::ports::SessionKey::new(
            TenantId::new("willow-creek").unwrap(),
            Channel::Voice,
            "+15551234567",
        ))
        .await
        .unwrap();
    assert_eq!(active.len(), 1);

    // Two turns before the spawns plus three spawned turns, both roles.
    let log = h.messages.for_session(active[0].id()).await.unwrap();
    assert_eq!(log.len(), 10);
}

#[tokio::test]
async fn couples_intake_collects_partner_details() {
    let h = Harness::new();

    h.say("hi").await;
    h.say("my partner and I want couples counseling").await;
    let ask = h.say("couples").await;
    assert!(ask.reply.contains("first name"));

    h.say("my name is Sam Rivera").await;
    h.say("sam@example.com").await;
    h.say("555-444-3333").await;
    let partner_ask = h.say("Texas").await;
    assert!(partner_ask.reply.contains("partner's name"));

    h.say("their name is Alex Rivera").await;
    h.say("alex@example.com").await;
    let insurance_ask = h.say("555-999-8888").await;
    assert_eq!(insurance_ask.stage, Stage::InsuranceInfo);

    h.say("united").await;
    let summary = h.say("weekends work best").await;
    assert_eq!(summary.stage, Stage::Confirmation);
    assert!(summary.reply.contains("Partner's name: Alex Rivera"));
    assert!(summary.reply.contains("UnitedHealthcare"));
}
