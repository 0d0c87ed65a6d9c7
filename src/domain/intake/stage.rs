//! Stages of the intake dialogue.
//!
//! A stage is one named step in the fixed intake progression. Stages move
//! strictly forward, with exactly two sanctioned exceptions: an inactivity
//! reset back to `Greeting`, and a confirmation rejection that regresses to
//! `ContactInfo` for corrections.

use serde::{Deserialize, Serialize};

/// The current stage of an intake conversation.
///
/// Canonical order:
/// `Greeting → ReasonForCall → ContactInfo → InsuranceInfo → Scheduling →
/// Confirmation → Completion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Opening exchange; coarse intent classification happens here.
    Greeting,

    /// Capture why the caller reached out; the disclaimer gate for new
    /// clients lives in this stage.
    ReasonForCall,

    /// Collect identity and contact fields in priority order.
    ContactInfo,

    /// Collect insurance carrier or self-pay status.
    InsuranceInfo,

    /// Collect day and time-of-day availability.
    Scheduling,

    /// Read back every collected field and ask for a yes/no.
    Confirmation,

    /// Terminal stage; the intake form has been written.
    Completion,
}

impl Stage {
    /// Returns the stage that follows this one in the fixed forward order.
    ///
    /// `Completion` has no successor.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Greeting => Some(Self::ReasonForCall),
            Self::ReasonForCall => Some(Self::ContactInfo),
            Self::ContactInfo => Some(Self::InsuranceInfo),
            Self::InsuranceInfo => Some(Self::Scheduling),
            Self::Scheduling => Some(Self::Confirmation),
            Self::Confirmation => Some(Self::Completion),
            Self::Completion => None,
        }
    }

    /// Position of the stage in the flow order, used to assert monotonicity.
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::Greeting => 0,
            Self::ReasonForCall => 1,
            Self::ContactInfo => 2,
            Self::InsuranceInfo => 3,
            Self::Scheduling => 4,
            Self::Confirmation => 5,
            Self::Completion => 6,
        }
    }

    /// Returns true if this stage ends the conversation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completion)
    }

    /// Returns true if transitioning to `target` is allowed.
    ///
    /// Allowed moves are: the single forward step, staying in place
    /// (re-prompts), the confirmation-rejection regression to `ContactInfo`,
    /// and the reset to `Greeting`.
    pub fn can_transition_to(&self, target: &Self) -> bool {
        if target == self {
            return true;
        }
        if self.next() == Some(*target) {
            return true;
        }
        matches!(
            (self, target),
            (Self::Confirmation, Self::ContactInfo) | (_, Self::Greeting)
        )
    }

    /// All stages in flow order.
    pub fn all() -> [Self; 7] {
        [
            Self::Greeting,
            Self::ReasonForCall,
            Self::ContactInfo,
            Self::InsuranceInfo,
            Self::Scheduling,
            Self::Confirmation,
            Self::Completion,
        ]
    }

    /// Stable snake_case name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::ReasonForCall => "reason_for_call",
            Self::ContactInfo => "contact_info",
            Self::InsuranceInfo => "insurance_info",
            Self::Scheduling => "scheduling",
            Self::Confirmation => "confirmation",
            Self::Completion => "completion",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::Greeting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stage_is_greeting() {
        assert_eq!(Stage::default(), Stage::Greeting);
    }

    #[test]
    fn serializes_to_snake_case() {
        let json = serde_json::to_string(&Stage::ReasonForCall).unwrap();
        assert_eq!(json, "\"reason_for_call\"");
    }

    #[test]
    fn deserializes_from_snake_case() {
        let stage: Stage = serde_json::from_str("\"insurance_info\"").unwrap();
        assert_eq!(stage, Stage::InsuranceInfo);
    }

    #[test]
    fn next_follows_fixed_order() {
        let stages = Stage::all();
        for pair in stages.windows(2) {
            assert_eq!(pair[0].next(), Some(pair[1]));
        }
        assert_eq!(Stage::Completion.next(), None);
    }

    #[test]
    fn ordinals_are_strictly_increasing() {
        let stages = Stage::all();
        for pair in stages.windows(2) {
            assert!(pair[0].ordinal() < pair[1].ordinal());
        }
    }

    #[test]
    fn only_completion_is_terminal() {
        for stage in Stage::all() {
            assert_eq!(stage.is_terminal(), stage == Stage::Completion);
        }
    }

    #[test]
    fn forward_step_is_always_allowed() {
        for stage in Stage::all() {
            if let Some(next) = stage.next() {
                assert!(stage.can_transition_to(&next));
            }
        }
    }

    #[test]
    fn staying_in_place_is_allowed() {
        for stage in Stage::all() {
            assert!(stage.can_transition_to(&stage));
        }
    }

    #[test]
    fn confirmation_may_regress_to_contact_info() {
        assert!(Stage::Confirmation.can_transition_to(&Stage::ContactInfo));
    }

    #[test]
    fn reset_to_greeting_is_allowed_from_anywhere() {
        for stage in Stage::all() {
            assert!(stage.can_transition_to(&Stage::Greeting));
        }
    }

    #[test]
    fn no_other_backward_or_skip_transitions() {
        // e.g. Scheduling cannot jump to Completion, ContactInfo cannot go
        // back to ReasonForCall.
        assert!(!Stage::Scheduling.can_transition_to(&Stage::Completion));
        assert!(!Stage::ContactInfo.can_transition_to(&Stage::ReasonForCall));
        assert!(!Stage::Greeting.can_transition_to(&Stage::ContactInfo));
        assert!(!Stage::InsuranceInfo.can_transition_to(&Stage::ContactInfo));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn any_stage() -> impl Strategy<Value = Stage> {
            (0..Stage::all().len()).prop_map(|i| Stage::all()[i])
        }

        proptest! {
            // Every allowed transition either moves forward (or stays) or
            // is one of the two sanctioned resets.
            #[test]
            fn allowed_transitions_never_move_backward(
                from in any_stage(),
                to in any_stage(),
            ) {
                if from.can_transition_to(&to) {
                    let sanctioned_reset = to == Stage::Greeting
                        || (from == Stage::Confirmation && to == Stage::ContactInfo);
                    prop_assert!(to.ordinal() >= from.ordinal() || sanctioned_reset);
                }
            }

            #[test]
            fn forward_moves_advance_by_exactly_one(from in any_stage(), to in any_stage()) {
                if from.can_transition_to(&to) && to.ordinal() > from.ordinal() {
                    prop_assert_eq!(to.ordinal(), from.ordinal() + 1);
                }
            }
        }
    }
}
