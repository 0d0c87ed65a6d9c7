//! Stage policy: what to ask next, and how each utterance moves the stage.
//!
//! The policy is deterministic. `next_prompt` is a pure read of the session;
//! `apply` mutates the session according to the fixed stage order, the
//! disclaimer gate, and the field priority list. All free-text understanding
//! is delegated to the extractor and intent modules.

use super::extractor::{
    extract_email, extract_explicit_scheduling, extract_explicit_service_type, extract_insurance,
    extract_known_insurance, extract_name, extract_phone, extract_prefixed_name,
    extract_scheduling, extract_service_type, extract_state, NamedPerson,
};
use super::fields::{CollectedFields, ServiceType};
use super::session::{IntakeSession, SessionStatus};
use super::stage::Stage;

/// Fixed reply when a collaborator fails mid-turn. The session keeps its
/// state, so the conversation resumes cleanly on the next utterance.
pub const FALLBACK_REPLY: &str = "I'm sorry, I'm having a little technical trouble on my end. \
     Let me transfer you to our staff, or we can pick this right back up in a moment.";

/// Fixed farewell for exit intents.
pub const FAREWELL_REPLY: &str =
    "No problem at all. Feel free to call or text back anytime. Goodbye!";

const DISCLAIMER_QUESTION: &str = "Since you're new to our practice, one quick note: \
     I'm an automated intake assistant, not a clinician, and this conversation isn't therapy \
     or medical advice. Is it okay to continue gathering your information?";

const DISCLAIMER_CLARIFY: &str = "Sorry, I just need a quick yes or no: \
     is it okay to continue gathering your intake information?";

const DISCLAIMER_DECLINED: &str = "That's completely fine. \
     Please call our front desk directly and they'll take care of you. Goodbye!";

const COMPLETION_REPLY: &str = "You're all set! I've passed your information to our intake team, \
     and someone will reach out shortly to finish scheduling. Thank you!";

/// Three-way classification of a yes/no answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YesNo {
    Yes,
    No,
    Ambiguous,
}

/// Classifies an utterance as an affirmative, a negative, or neither.
///
/// Negatives are checked first: "not right" must not count as "right", and
/// "incorrect" must not count as "correct". Short words match on token
/// boundaries so "no" doesn't fire inside "know".
pub fn classify_yes_no(text: &str) -> YesNo {
    let lower = text.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|t| !t.is_empty())
        .collect();

    const NO_WORDS: [&str; 4] = ["no", "nope", "wrong", "incorrect"];
    const NO_PHRASES: [&str; 2] = ["not right", "don't continue"];
    if tokens.iter().any(|t| NO_WORDS.contains(t)) || NO_PHRASES.iter().any(|p| lower.contains(p))
    {
        return YesNo::No;
    }

    const YES_WORDS: [&str; 9] = [
        "yes",
        "yeah",
        "yep",
        "correct",
        "sure",
        "ok",
        "okay",
        "absolutely",
        "right",
    ];
    const YES_PHRASES: [&str; 3] = ["sounds good", "that works", "i agree"];
    if tokens.iter().any(|t| YES_WORDS.contains(t))
        || YES_PHRASES.iter().any(|p| lower.contains(p))
    {
        return YesNo::Yes;
    }

    YesNo::Ambiguous
}

/// The next still-missing field in the fixed priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldAsk {
    ServiceType,
    FirstName,
    LastName,
    Email,
    Phone,
    State,
    ChildName,
    PartnerName,
    PartnerEmail,
    PartnerPhone,
}

fn next_missing_contact_field(fields: &CollectedFields) -> Option<FieldAsk> {
    if fields.service_type.is_none() {
        return Some(FieldAsk::ServiceType);
    }
    if fields.first_name.is_none() {
        return Some(FieldAsk::FirstName);
    }
    if fields.last_name.is_none() {
        return Some(FieldAsk::LastName);
    }
    if fields.email.is_none() {
        return Some(FieldAsk::Email);
    }
    if fields.phone.is_none() {
        return Some(FieldAsk::Phone);
    }
    if fields.state.is_none() {
        return Some(FieldAsk::State);
    }
    match fields.service_type {
        Some(ServiceType::Child) if fields.child_name.is_none() => Some(FieldAsk::ChildName),
        Some(ServiceType::Couples) => {
            if fields.partner_name.is_none() {
                Some(FieldAsk::PartnerName)
            } else if fields.partner_email.is_none() {
                Some(FieldAsk::PartnerEmail)
            } else if fields.partner_phone.is_none() {
                Some(FieldAsk::PartnerPhone)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn prompt_for(ask: FieldAsk) -> &'static str {
    match ask {
        FieldAsk::ServiceType => {
            "Is this for individual counseling, couples counseling, or for a child?"
        }
        FieldAsk::FirstName => "Can I get your first name?",
        FieldAsk::LastName => "Thanks! And your last name?",
        FieldAsk::Email => "What's the best email address for you?",
        FieldAsk::Phone => "And the best phone number to reach you?",
        FieldAsk::State => "Which state are you located in?",
        FieldAsk::ChildName => "What's your child's name?",
        FieldAsk::PartnerName => "What's your partner's name?",
        FieldAsk::PartnerEmail => "What's an email address for your partner?",
        FieldAsk::PartnerPhone => "And a phone number for your partner?",
    }
}

/// Renders the read-back summary for the confirmation stage.
///
/// Every collected field appears with its literal value; required-but-absent
/// fields render as the literal string "Not provided". Conditional fields
/// only appear for the matching service type.
pub fn confirmation_summary(fields: &CollectedFields) -> String {
    fn line(label: &str, value: Option<String>) -> String {
        format!(
            "- {}: {}",
            label,
            value.unwrap_or_else(|| "Not provided".to_string())
        )
    }

    let mut lines = vec![
        "Here's what I have so far:".to_string(),
        line("Name", fields.full_name()),
        line("Email", fields.email.clone()),
        line("Phone", fields.phone.clone()),
        line("State", fields.state.clone()),
        line(
            "Service",
            fields.service_type.map(|s| s.to_string()),
        ),
        line(
            "Insurance",
            fields.insurance.as_ref().map(|i| i.to_string()),
        ),
        line("Reason for calling", fields.reason.clone()),
        line(
            "Availability",
            fields.availability.as_ref().map(|a| a.to_string()),
        ),
    ];
    match fields.service_type {
        Some(ServiceType::Child) => {
            lines.push(line("Child's name", fields.child_name.clone()));
        }
        Some(ServiceType::Couples) => {
            lines.push(line("Partner's name", fields.partner_name.clone()));
            lines.push(line("Partner's email", fields.partner_email.clone()));
            lines.push(line("Partner's phone", fields.partner_phone.clone()));
        }
        _ => {}
    }
    lines.push("Did I get everything right?".to_string());
    lines.join("\n")
}

/// Result of applying one utterance to the session.
#[derive(Debug, Clone)]
pub struct PolicyOutcome {
    pub reply: String,
    pub end_call: bool,
    /// True on the turn the intake form becomes ready to persist.
    pub intake_complete: bool,
    /// True when the reply is conversational filler the completion
    /// collaborator may rephrase for warmth.
    pub wants_phrasing: bool,
}

impl PolicyOutcome {
    fn ask(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            end_call: false,
            intake_complete: false,
            wants_phrasing: false,
        }
    }
}

/// Stage transition and prompting rules.
pub struct StagePolicy;

impl StagePolicy {
    /// The prompt for the session's current stage.
    ///
    /// Pure read: calling this repeatedly without an intervening
    /// `process_response` returns the same string.
    pub fn next_prompt(session: &IntakeSession) -> String {
        let fields = session.fields();
        match session.stage() {
            Stage::Greeting => "Thanks for reaching out to our practice! \
                 I'm the intake assistant and I can get you set up. \
                 What brings you to call today?"
                .to_string(),
            Stage::ReasonForCall => {
                if fields.reason.is_none() {
                    "What brings you to call today?".to_string()
                } else if session.disclaimer_pending() {
                    DISCLAIMER_QUESTION.to_string()
                } else {
                    // Reason captured, no gate: the contact questions begin.
                    next_missing_contact_field(fields)
                        .map(|ask| prompt_for(ask).to_string())
                        .unwrap_or_else(|| prompt_for(FieldAsk::ServiceType).to_string())
                }
            }
            Stage::ContactInfo => next_missing_contact_field(fields)
                .map(|ask| prompt_for(ask).to_string())
                .unwrap_or_else(|| {
                    "Is there anything you'd like to correct?".to_string()
                }),
            Stage::InsuranceInfo => {
                "Do you plan to use insurance? If so, which carrier?".to_string()
            }
            Stage::Scheduling => {
                "What days and times usually work best for you?".to_string()
            }
            Stage::Confirmation => confirmation_summary(fields),
            Stage::Completion => COMPLETION_REPLY.to_string(),
        }
    }

    /// Applies one caller utterance to the session.
    ///
    /// Exit-intent handling happens before this in
    /// [`IntakeSession::process_response`]; by the time we get here the
    /// utterance is a genuine answer for the current stage.
    pub fn apply(session: &mut IntakeSession, text: &str) -> PolicyOutcome {
        match session.stage() {
            Stage::Greeting => Self::apply_greeting(session),
            Stage::ReasonForCall => Self::apply_reason(session, text),
            Stage::ContactInfo => Self::apply_contact_info(session, text),
            Stage::InsuranceInfo => Self::apply_insurance(session, text),
            Stage::Scheduling => Self::apply_scheduling(session, text),
            Stage::Confirmation => Self::apply_confirmation(session, text),
            Stage::Completion => PolicyOutcome {
                reply: COMPLETION_REPLY.to_string(),
                end_call: true,
                intake_complete: false,
                wants_phrasing: false,
            },
        }
    }

    fn apply_greeting(session: &mut IntakeSession) -> PolicyOutcome {
        session.set_stage(Stage::ReasonForCall);
        let mut outcome = PolicyOutcome::ask("What brings you to call today?");
        outcome.wants_phrasing = true;
        outcome
    }

    fn apply_reason(session: &mut IntakeSession, text: &str) -> PolicyOutcome {
        if session.fields().reason.is_none() {
            let overwrite = session.is_revising();
            session.fields_mut().set_reason(text.trim(), overwrite);
            if session.disclaimer_pending() {
                let mut outcome = PolicyOutcome::ask(DISCLAIMER_QUESTION);
                outcome.wants_phrasing = true;
                return outcome;
            }
            session.set_stage(Stage::ContactInfo);
            let mut outcome = PolicyOutcome::ask(Self::next_prompt(session));
            outcome.wants_phrasing = true;
            return outcome;
        }

        // Reason already captured; the only thing left here is the gate.
        if session.disclaimer_pending() {
            return match classify_yes_no(text) {
                YesNo::Yes => {
                    session.accept_disclaimer();
                    session.set_stage(Stage::ContactInfo);
                    PolicyOutcome::ask(Self::next_prompt(session))
                }
                YesNo::No => {
                    session.decline_disclaimer();
                    PolicyOutcome {
                        reply: DISCLAIMER_DECLINED.to_string(),
                        end_call: true,
                        intake_complete: false,
                        wants_phrasing: false,
                    }
                }
                YesNo::Ambiguous => PolicyOutcome::ask(DISCLAIMER_CLARIFY),
            };
        }

        session.set_stage(Stage::ContactInfo);
        PolicyOutcome::ask(Self::next_prompt(session))
    }

    fn apply_contact_info(session: &mut IntakeSession, text: &str) -> PolicyOutcome {
        let overwrite = session.is_revising();
        let asked = next_missing_contact_field(session.fields());
        let fields = session.fields_mut();
        let mentions_partner = text.to_lowercase().contains("partner");

        // Email and phone are unambiguous patterns; harvest them on any
        // contact-info turn regardless of which field was asked for.
        let mut extracted = false;
        if let Some(email) = extract_email(text) {
            extracted |= match asked {
                Some(FieldAsk::PartnerEmail) => fields.set_partner_email(email, overwrite),
                _ if overwrite && mentions_partner => fields.set_partner_email(email, overwrite),
                _ => fields.set_email(email, overwrite),
            };
        }
        if let Some(phone) = extract_phone(text) {
            extracted |= match asked {
                Some(FieldAsk::PartnerPhone) => fields.set_partner_phone(phone, overwrite),
                _ if overwrite && mentions_partner => fields.set_partner_phone(phone, overwrite),
                _ => fields.set_phone(phone, overwrite),
            };
        }

        // In revision mode the caller may correct any populated field, not
        // just the next missing one; route explicit signals first.
        let mut corrected = false;
        if overwrite {
            corrected = Self::apply_correction(fields, text);
            extracted |= corrected;
        }

        // Name and free-text answers only count for the field we asked for;
        // the name heuristic is too loose to run opportunistically.
        match if corrected { None } else { asked } {
            Some(FieldAsk::ServiceType) => {
                if let Some(service) = extract_service_type(text) {
                    extracted |= fields.set_service_type(service, overwrite);
                }
            }
            Some(FieldAsk::FirstName) => {
                if let Some(name) = extract_name(text) {
                    match name.split_once(char::is_whitespace) {
                        Some((first, last)) => {
                            extracted |= fields.set_first_name(first.trim(), overwrite);
                            fields.set_last_name(last.trim(), overwrite);
                        }
                        None => extracted |= fields.set_first_name(name, overwrite),
                    }
                }
            }
            Some(FieldAsk::LastName) => {
                if let Some(name) = extract_name(text) {
                    extracted |= fields.set_last_name(name, overwrite);
                }
            }
            Some(FieldAsk::State) => {
                let state = text.trim();
                if !state.is_empty() && extract_email(text).is_none() && extract_phone(text).is_none()
                {
                    extracted |= fields.set_state(state, overwrite);
                }
            }
            Some(FieldAsk::ChildName) => {
                if let Some(name) = extract_name(text) {
                    extracted |= fields.set_child_name(name, overwrite);
                }
            }
            Some(FieldAsk::PartnerName) => {
                if let Some(name) = extract_name(text) {
                    extracted |= fields.set_partner_name(name, overwrite);
                }
            }
            _ => {}
        }

        let complete = session.fields().contact_info_complete();
        if complete && (extracted || !overwrite) {
            Self::advance_past_collection(session)
        } else if extracted {
            PolicyOutcome::ask(Self::next_prompt(session))
        } else if complete && classify_yes_no(text) == YesNo::Yes {
            // "actually it's fine": back to the read-back.
            Self::advance_past_collection(session)
        } else {
            let reprompt = format!(
                "Sorry, I didn't quite catch that. {}",
                Self::next_prompt(session)
            );
            PolicyOutcome::ask(reprompt)
        }
    }

    /// Routes a correction utterance onto the field it names.
    ///
    /// Only unambiguous signals are honored: an explicit introduction
    /// phrase for a name, a known state name, explicit carrier or self-pay
    /// wording, a named day or time of day, or a service-type keyword.
    /// Anything vaguer re-prompts rather than guessing.
    fn apply_correction(fields: &mut CollectedFields, text: &str) -> bool {
        let mut changed = false;

        let state_hit = extract_state(text);
        // "my name is Virginia" is a name; "I'm from Michigan" is a state.
        let name_is_explicit = text.to_lowercase().contains("name is");
        if let Some((person, name)) = extract_prefixed_name(text) {
            if state_hit.is_none() || name_is_explicit {
                changed |= match (person, fields.service_type) {
                    (NamedPerson::ThirdParty, Some(ServiceType::Couples)) => {
                        fields.set_partner_name(&name, true)
                    }
                    (NamedPerson::ThirdParty, Some(ServiceType::Child)) => {
                        fields.set_child_name(&name, true)
                    }
                    _ => match name.split_once(char::is_whitespace) {
                        Some((first, last)) => {
                            let first_set = fields.set_first_name(first.trim(), true);
                            fields.set_last_name(last.trim(), true) || first_set
                        }
                        None => fields.set_first_name(&name, true),
                    },
                };
            }
        }
        if let Some(state) = state_hit {
            if !name_is_explicit {
                changed |= fields.set_state(state, true);
            }
        }
        if let Some(insurance) = extract_known_insurance(text) {
            changed |= fields.set_insurance(insurance, true);
        }
        if let Some(pref) = extract_explicit_scheduling(text) {
            changed |= fields.set_availability(pref, true);
        }
        if let Some(service) = extract_explicit_service_type(text) {
            changed |= fields.set_service_type(service, true);
        }
        changed
    }

    fn apply_insurance(session: &mut IntakeSession, text: &str) -> PolicyOutcome {
        let overwrite = session.is_revising();
        if let Some(insurance) = extract_insurance(text) {
            session.fields_mut().set_insurance(insurance, overwrite);
        }
        if session.fields().insurance.is_some() {
            Self::advance_past_collection(session)
        } else {
            PolicyOutcome::ask(format!(
                "Sorry, I didn't quite catch that. {}",
                Self::next_prompt(session)
            ))
        }
    }

    fn apply_scheduling(session: &mut IntakeSession, text: &str) -> PolicyOutcome {
        let overwrite = session.is_revising();
        if let Some(pref) = extract_scheduling(text) {
            session.fields_mut().set_availability(pref, overwrite);
        }
        if session.fields().availability.is_some() {
            Self::advance_past_collection(session)
        } else {
            PolicyOutcome::ask(format!(
                "Sorry, I didn't quite catch that. {}",
                Self::next_prompt(session)
            ))
        }
    }

    fn apply_confirmation(session: &mut IntakeSession, text: &str) -> PolicyOutcome {
        match classify_yes_no(text) {
            YesNo::Yes => {
                session.set_stage(Stage::Completion);
                session.set_status(SessionStatus::Completed);
                PolicyOutcome {
                    reply: COMPLETION_REPLY.to_string(),
                    end_call: true,
                    intake_complete: true,
                    wants_phrasing: false,
                }
            }
            YesNo::No => {
                // Regress for corrections; collected fields are kept and the
                // revision flag lets new answers overwrite them.
                session.set_stage(Stage::ContactInfo);
                session.begin_revision();
                PolicyOutcome::ask(
                    "No problem, let's fix that. What should I correct? \
                     You can just say the corrected detail.",
                )
            }
            YesNo::Ambiguous => {
                PolicyOutcome::ask(confirmation_summary(session.fields()))
            }
        }
    }

    /// Walks the stage forward past every collection stage whose fields are
    /// already satisfied, stopping at the first stage with work left (or at
    /// confirmation). After a revision turn this chains straight back to the
    /// read-back summary.
    fn advance_past_collection(session: &mut IntakeSession) -> PolicyOutcome {
        loop {
            let satisfied = match session.stage() {
                Stage::ContactInfo => session.fields().contact_info_complete(),
                Stage::InsuranceInfo => session.fields().insurance.is_some(),
                Stage::Scheduling => session.fields().availability.is_some(),
                _ => false,
            };
            if !satisfied {
                break;
            }
            match session.stage().next() {
                Some(next) => session.set_stage(next),
                None => break,
            }
            if session.stage() == Stage::Confirmation {
                break;
            }
        }
        PolicyOutcome::ask(Self::next_prompt(session))
    }
}
