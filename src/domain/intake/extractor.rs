//! Pure field extraction from free-form utterance text.
//!
//! Every function here is deterministic, side-effect free, and total: a
//! failed match is an `Option::None`, never an error. Each heuristic lives
//! here rather than inline in the state machine so it has its own unit-test
//! surface and can be swapped for a model-based classifier without touching
//! stage logic.

use once_cell::sync::Lazy;
use regex::Regex;

use super::fields::{
    Insurance, PreferredDay, SchedulingPreference, ServiceType, TimePreference,
};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").unwrap()
});

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    // 10 digits, optionally split by '-' or '.' after the 3rd and 6th.
    Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").unwrap()
});

/// Leading introduction phrases stripped before treating the remainder as a
/// name. Covers self-introductions plus the third-person forms used when
/// giving a partner's or child's name. Order matters: longer phrases first
/// so "i am" wins over "i".
const NAME_PREFIXES: [&str; 8] = [
    "my name is",
    "their name is",
    "her name is",
    "his name is",
    "i am",
    "i'm",
    "this is",
    "it's",
];

const SELF_PAY: [&str; 5] = ["self pay", "self-pay", "out of pocket", "no insurance", "cash"];

const CARRIERS: [(&str, &str); 6] = [
    ("blue cross", "Blue Cross Blue Shield"),
    ("bcbs", "Blue Cross Blue Shield"),
    ("aetna", "Aetna"),
    ("cigna", "Cigna"),
    ("united", "UnitedHealthcare"),
    ("medicaid", "Medicaid"),
];

/// US state names in canonical capitalization. "West Virginia" precedes
/// "Virginia" and "Arkansas" precedes "Kansas" so the longer name wins
/// containment.
const STATES: [&str; 50] = [
    "West Virginia",
    "Arkansas",
    "Alabama",
    "Alaska",
    "Arizona",
    "California",
    "Colorado",
    "Connecticut",
    "Delaware",
    "Florida",
    "Georgia",
    "Hawaii",
    "Idaho",
    "Illinois",
    "Indiana",
    "Iowa",
    "Kansas",
    "Kentucky",
    "Louisiana",
    "Maine",
    "Maryland",
    "Massachusetts",
    "Michigan",
    "Minnesota",
    "Mississippi",
    "Missouri",
    "Montana",
    "Nebraska",
    "Nevada",
    "New Hampshire",
    "New Jersey",
    "New Mexico",
    "New York",
    "North Carolina",
    "North Dakota",
    "Ohio",
    "Oklahoma",
    "Oregon",
    "Pennsylvania",
    "Rhode Island",
    "South Carolina",
    "South Dakota",
    "Tennessee",
    "Texas",
    "Utah",
    "Vermont",
    "Virginia",
    "Washington",
    "Wisconsin",
    "Wyoming",
];

/// Who an introduction phrase refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedPerson {
    Caller,
    ThirdParty,
}

/// Extracts the first well-formed email address, if any.
pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_string())
}

/// Extracts the first 10-digit phone number, allowing `-` or `.` separators.
pub fn extract_phone(text: &str) -> Option<String> {
    PHONE_RE.find(text).map(|m| m.as_str().to_string())
}

/// Extracts a name from an utterance.
///
/// Only attempted when the same utterance matched no email or phone pattern;
/// strips a fixed set of leading self-introduction phrases, then takes the
/// trimmed remainder. This can misfire on utterances that are neither a name
/// nor contact info - an accepted limitation of the heuristic.
pub fn extract_name(text: &str) -> Option<String> {
    if extract_email(text).is_some() || extract_phone(text).is_some() {
        return None;
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_lowercase();
    let mut remainder = trimmed;
    for prefix in NAME_PREFIXES {
        if lower.starts_with(prefix) {
            remainder = trimmed[prefix.len()..].trim_start();
            break;
        }
    }

    let name = remainder.trim().trim_matches(|c: char| {
        c == '.' || c == ',' || c == '!' || c == '?'
    });
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Extracts a name only when the utterance opens with an explicit
/// introduction phrase, along with who the phrase refers to.
///
/// Unlike [`extract_name`] this never falls back to the raw utterance, so
/// it is safe to run on turns that may not be about a name at all.
pub fn extract_prefixed_name(text: &str) -> Option<(NamedPerson, String)> {
    if extract_email(text).is_some() || extract_phone(text).is_some() {
        return None;
    }

    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();
    for prefix in NAME_PREFIXES {
        if !lower.starts_with(prefix) {
            continue;
        }
        let person = match prefix {
            "their name is" | "her name is" | "his name is" => NamedPerson::ThirdParty,
            _ => NamedPerson::Caller,
        };
        let name = trimmed[prefix.len()..]
            .trim()
            .trim_matches(|c: char| c == '.' || c == ',' || c == '!' || c == '?');
        if name.is_empty() {
            return None;
        }
        return Some((person, name.to_string()));
    }
    None
}

/// Extracts a US state mentioned anywhere in the utterance, canonically
/// capitalized.
pub fn extract_state(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    STATES
        .iter()
        .find(|state| lower.contains(&state.to_lowercase()))
        .map(|state| state.to_string())
}

/// Extracts an insurance answer.
///
/// Check order matters and first match wins: self-pay phrases are checked
/// before any carrier or generic "insurance" keyword, then known carriers in
/// a fixed order, then a bare affirmative becomes a follow-up placeholder,
/// and anything else is stored verbatim as a free-form carrier name.
pub fn extract_insurance(text: &str) -> Option<Insurance> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(known) = extract_known_insurance(text) {
        return Some(known);
    }

    let lower = trimmed.to_lowercase();
    if lower.contains("yes") || lower.contains("have insurance") {
        return Some(Insurance::NeedsFollowUp);
    }

    Some(Insurance::Carrier(trimmed.to_string()))
}

/// Insurance extraction restricted to explicit signals: self-pay phrases
/// and known carrier keywords. No verbatim or affirmative fallback, so it
/// is safe outside the insurance stage.
pub fn extract_known_insurance(text: &str) -> Option<Insurance> {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }

    if SELF_PAY.iter().any(|p| lower.contains(p)) {
        return Some(Insurance::SelfPay);
    }
    for (keyword, carrier) in CARRIERS {
        if lower.contains(keyword) {
            return Some(Insurance::Carrier(carrier.to_string()));
        }
    }
    None
}

/// Extracts scheduling preferences: any mentioned weekdays plus a single
/// weekend bucket, and a time-of-day classified by priority
/// (after-work > evening > afternoon > morning > flexible).
///
/// Returns `None` only for blank input; an utterance with no recognizable
/// day or time still yields a `Flexible` preference with the raw text kept
/// for audit.
pub fn extract_scheduling(text: &str) -> Option<SchedulingPreference> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();

    let mut days = Vec::new();
    const WEEKDAYS: [(&str, PreferredDay); 5] = [
        ("monday", PreferredDay::Monday),
        ("tuesday", PreferredDay::Tuesday),
        ("wednesday", PreferredDay::Wednesday),
        ("thursday", PreferredDay::Thursday),
        ("friday", PreferredDay::Friday),
    ];
    for (keyword, day) in WEEKDAYS {
        if lower.contains(keyword) {
            days.push(day);
        }
    }
    if ["saturday", "sunday", "weekend"]
        .iter()
        .any(|k| lower.contains(k))
    {
        days.push(PreferredDay::Weekend);
    }

    let time = if lower.contains("after work") || lower.contains("after 5") {
        TimePreference::AfterWork
    } else if lower.contains("evening") {
        TimePreference::Evening
    } else if lower.contains("afternoon") {
        TimePreference::Afternoon
    } else if lower.contains("morning") {
        TimePreference::Morning
    } else {
        TimePreference::Flexible
    };

    Some(SchedulingPreference {
        days,
        time,
        raw_input: trimmed.to_string(),
    })
}

/// Like [`extract_scheduling`] but only when the utterance actually names a
/// day or a time of day; no flexible fallback.
pub fn extract_explicit_scheduling(text: &str) -> Option<SchedulingPreference> {
    let pref = extract_scheduling(text)?;
    if pref.days.is_empty() && pref.time == TimePreference::Flexible {
        return None;
    }
    Some(pref)
}

/// Classifies the kind of care requested from keyword presence.
pub fn extract_service_type(text: &str) -> Option<ServiceType> {
    let lower = text.to_lowercase();
    if lower.trim().is_empty() {
        return None;
    }
    if lower.contains("couple") || lower.contains("marriage") || lower.contains("partner") {
        Some(ServiceType::Couples)
    } else if lower.contains("child")
        || lower.contains("kid")
        || lower.contains("son")
        || lower.contains("daughter")
        || lower.contains("teen")
    {
        Some(ServiceType::Child)
    } else {
        Some(ServiceType::Individual)
    }
}

/// Service-type classification restricted to explicit keywords.
///
/// Unlike [`extract_service_type`] there is no individual fallback, so it
/// is safe to run on utterances that may not be about service type at all.
pub fn extract_explicit_service_type(text: &str) -> Option<ServiceType> {
    let lower = text.to_lowercase();
    if lower.contains("couple") || lower.contains("marriage") {
        Some(ServiceType::Couples)
    } else if lower.contains("child")
        || lower.contains("kid")
        || lower.contains("my son")
        || lower.contains("my daughter")
        || lower.contains("teen")
    {
        Some(ServiceType::Child)
    } else if lower.contains("individual") || lower.contains("just me") || lower.contains("myself")
    {
        Some(ServiceType::Individual)
    } else {
        None
    }
}
