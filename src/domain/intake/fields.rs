//! Collected intake fields and their value objects.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of care the caller is seeking.
///
/// Drives which conditional fields become required: `Child` requires the
/// child's name, `Couples` requires partner contact details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Individual,
    Couples,
    Child,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Individual => "Individual",
            Self::Couples => "Couples",
            Self::Child => "Child",
        };
        write!(f, "{}", s)
    }
}

/// Insurance status extracted from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "carrier")]
pub enum Insurance {
    /// Caller pays out of pocket.
    SelfPay,
    /// A recognized or free-form carrier name.
    Carrier(String),
    /// Caller said they have insurance but named no carrier; staff follow up.
    NeedsFollowUp,
}

impl fmt::Display for Insurance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfPay => write!(f, "Self-pay"),
            Self::Carrier(name) => write!(f, "{}", name),
            Self::NeedsFollowUp => write!(f, "Has insurance (carrier to confirm)"),
        }
    }
}

/// A day bucket the caller can attend.
///
/// Weekdays are tracked individually; Saturday, Sunday, and generic
/// "weekend" mentions collapse into one `Weekend` bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferredDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Weekend,
}

impl fmt::Display for PreferredDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Weekend => "Weekend",
        };
        write!(f, "{}", s)
    }
}

/// Time-of-day preference, classified in strict priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePreference {
    AfterWork,
    Evening,
    Afternoon,
    Morning,
    Flexible,
}

impl fmt::Display for TimePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AfterWork => "After work",
            Self::Evening => "Evening",
            Self::Afternoon => "Afternoon",
            Self::Morning => "Morning",
            Self::Flexible => "Flexible",
        };
        write!(f, "{}", s)
    }
}

/// Day and time availability, with the raw utterance kept for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingPreference {
    pub days: Vec<PreferredDay>,
    pub time: TimePreference,
    pub raw_input: String,
}

impl fmt::Display for SchedulingPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.days.is_empty() {
            write!(f, "Any day, {}", self.time)
        } else {
            let days = self
                .days
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, "{}, {}", days, self.time)
        }
    }
}

/// Structured data extracted from the caller so far.
///
/// Fields are set monotonically: a setter on a populated field is a no-op
/// unless `overwrite` is passed, which only the confirmation-rejection
/// revision path does. A full reset replaces the whole struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectedFields {
    pub service_type: Option<ServiceType>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub state: Option<String>,
    pub insurance: Option<Insurance>,
    pub reason: Option<String>,
    pub child_name: Option<String>,
    pub partner_name: Option<String>,
    pub partner_email: Option<String>,
    pub partner_phone: Option<String>,
    pub availability: Option<SchedulingPreference>,
}

impl CollectedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full name joined from first and last, when at least one is present.
    pub fn full_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(first), None) => Some(first.clone()),
            (None, Some(last)) => Some(last.clone()),
            (None, None) => None,
        }
    }

    /// Count of populated required fields (name, email, phone, reason).
    pub fn required_populated(&self) -> usize {
        [
            self.full_name().is_some(),
            self.email.is_some(),
            self.phone.is_some(),
            self.reason.is_some(),
        ]
        .iter()
        .filter(|p| **p)
        .count()
    }

    /// True when every field applicable to the detected service type that the
    /// contact-info stage owns is present.
    pub fn contact_info_complete(&self) -> bool {
        let base = self.service_type.is_some()
            && self.first_name.is_some()
            && self.last_name.is_some()
            && self.email.is_some()
            && self.phone.is_some()
            && self.state.is_some();
        if !base {
            return false;
        }
        match self.service_type {
            Some(ServiceType::Child) => self.child_name.is_some(),
            Some(ServiceType::Couples) => {
                self.partner_name.is_some()
                    && self.partner_email.is_some()
                    && self.partner_phone.is_some()
            }
            _ => true,
        }
    }

    fn set_opt<T>(slot: &mut Option<T>, value: T, overwrite: bool) -> bool {
        if slot.is_none() || overwrite {
            *slot = Some(value);
            true
        } else {
            false
        }
    }

    /// Monotonic setters. Each returns true if the value was stored.
    pub fn set_service_type(&mut self, v: ServiceType, overwrite: bool) -> bool {
        Self::set_opt(&mut self.service_type, v, overwrite)
    }

    pub fn set_first_name(&mut self, v: impl Into<String>, overwrite: bool) -> bool {
        Self::set_opt(&mut self.first_name, v.into(), overwrite)
    }

    pub fn set_last_name(&mut self, v: impl Into<String>, overwrite: bool) -> bool {
        Self::set_opt(&mut self.last_name, v.into(), overwrite)
    }

    pub fn set_email(&mut self, v: impl Into<String>, overwrite: bool) -> bool {
        Self::set_opt(&mut self.email, v.into(), overwrite)
    }

    pub fn set_phone(&mut self, v: impl Into<String>, overwrite: bool) -> bool {
        Self::set_opt(&mut self.phone, v.into(), overwrite)
    }

    pub fn set_state(&mut self, v: impl Into<String>, overwrite: bool) -> bool {
        Self::set_opt(&mut self.state, v.into(), overwrite)
    }

    pub fn set_insurance(&mut self, v: Insurance, overwrite: bool) -> bool {
        Self::set_opt(&mut self.insurance, v, overwrite)
    }

    pub fn set_reason(&mut self, v: impl Into<String>, overwrite: bool) -> bool {
        Self::set_opt(&mut self.reason, v.into(), overwrite)
    }

    pub fn set_child_name(&mut self, v: impl Into<String>, overwrite: bool) -> bool {
        Self::set_opt(&mut self.child_name, v.into(), overwrite)
    }

    pub fn set_partner_name(&mut self, v: impl Into<String>, overwrite: bool) -> bool {
        Self::set_opt(&mut self.partner_name, v.into(), overwrite)
    }

    pub fn set_partner_email(&mut self, v: impl Into<String>, overwrite: bool) -> bool {
        Self::set_opt(&mut self.partner_email, v.into(), overwrite)
    }

    pub fn set_partner_phone(&mut self, v: impl Into<String>, overwrite: bool) -> bool {
        Self::set_opt(&mut self.partner_phone, v.into(), overwrite)
    }

    pub fn set_availability(&mut self, v: SchedulingPreference, overwrite: bool) -> bool {
        Self::set_opt(&mut self.availability, v, overwrite)
    }
}
