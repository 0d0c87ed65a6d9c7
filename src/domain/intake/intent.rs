//! Coarse intent heuristics.
//!
//! Exit detection runs before any stage-specific processing on every turn.
//! New-client and crisis detection are low-confidence keyword checks and are
//! allowed to be wrong: a false negative proceeds as a returning-client
//! flow, a false positive costs one harmless extra disclaimer question.

use serde::{Deserialize, Serialize};

/// Phrases that end the conversation immediately, matched case-insensitively
/// as substrings anywhere in the utterance.
const EXIT_PHRASES: [&str; 7] = [
    "gotta go",
    "have to go",
    "call back",
    "talk later",
    "goodbye",
    "bye",
    "not now",
];

const NEW_CLIENT_KEYWORDS: [&str; 5] = [
    "new client",
    "new patient",
    "first time",
    "never been",
    "haven't been before",
];

const CRISIS_KEYWORDS: [&str; 9] = [
    "hurt myself",
    "kill myself",
    "suicide",
    "suicidal",
    "end my life",
    "self harm",
    "self-harm",
    "emergency",
    "crisis",
];

/// Coarse classification of a single utterance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoughIntent {
    pub new_client: bool,
    pub crisis: bool,
}

/// Returns true if the caller wants to end the conversation.
pub fn is_exit_intent(text: &str) -> bool {
    let lower = text.to_lowercase();
    EXIT_PHRASES.iter().any(|p| lower.contains(p))
}

/// Classifies an utterance for new-client and crisis signals.
pub fn classify_rough_intent(text: &str) -> RoughIntent {
    let lower = text.to_lowercase();
    RoughIntent {
        new_client: NEW_CLIENT_KEYWORDS.iter().any(|k| lower.contains(k)),
        crisis: CRISIS_KEYWORDS.iter().any(|k| lower.contains(k)),
    }
}
