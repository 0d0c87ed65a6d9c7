//! Intake conversation core: stages, field extraction, intents, policy,
//! and the session entity that ties them together.

mod extractor;
mod fields;
mod intent;
mod policy;
mod session;
mod stage;

pub use extractor::{
    extract_email, extract_insurance, extract_name, extract_phone, extract_scheduling,
    extract_service_type,
};
pub use fields::{
    CollectedFields, Insurance, PreferredDay, SchedulingPreference, ServiceType, TimePreference,
};
pub use intent::{classify_rough_intent, is_exit_intent, RoughIntent};
pub use policy::{classify_yes_no, StagePolicy, YesNo, FALLBACK_REPLY, FAREWELL_REPLY};
pub use session::{
    Channel, HistoryEntry, HistoryRole, IntakeSession, SessionStatus, TurnOutcome,
    CRISIS_PREAMBLE,
};
pub use stage::Stage;
