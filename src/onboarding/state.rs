//! Onboarding state machine, tracking which stage the lead capture is in.

use serde::{Deserialize, Serialize};

/// The stages of the lead capture conversation.
///
/// Progresses linearly: StartDecision → AwaitPlatform → AwaitEmail →
/// AwaitPhone → AwaitRegion → Review. Cancelled is reachable from any
/// non-terminal stage, and Review loops back to AwaitPlatform when the
/// user asks to edit their details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    StartDecision,
    AwaitPlatform,
    AwaitEmail,
    AwaitPhone,
    AwaitRegion,
    Review,
    Cancelled,
}

impl Stage {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: Stage) -> bool {
        use Stage::*;
        if target == Cancelled {
            return !self.is_terminal();
        }
        matches!(
            (self, target),
            (StartDecision, AwaitPlatform)
                // Platform step is skipped when no platform set is configured.
                | (StartDecision, AwaitEmail)
                | (AwaitPlatform, AwaitEmail)
                | (AwaitEmail, AwaitPhone)
                | (AwaitPhone, AwaitRegion)
                | (AwaitRegion, Review)
                | (Review, AwaitPlatform)
                | (Review, AwaitEmail)
        )
    }

    /// Whether this stage ends the conversation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::StartDecision
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::StartDecision => "start_decision",
            Self::AwaitPlatform => "await_platform",
            Self::AwaitEmail => "await_email",
            Self::AwaitPhone => "await_phone",
            Self::AwaitRegion => "await_region",
            Self::Review => "review",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_progression_is_allowed() {
        let order = [
            Stage::StartDecision,
            Stage::AwaitPlatform,
            Stage::AwaitEmail,
            Stage::AwaitPhone,
            Stage::AwaitRegion,
            Stage::Review,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn skipping_stages_is_rejected() {
        assert!(!Stage::StartDecision.can_transition_to(Stage::AwaitPhone));
        assert!(!Stage::AwaitPlatform.can_transition_to(Stage::Review));
    }

    #[test]
    fn platform_step_can_be_skipped() {
        assert!(Stage::StartDecision.can_transition_to(Stage::AwaitEmail));
    }

    #[test]
    fn review_loops_back_for_edits() {
        assert!(Stage::Review.can_transition_to(Stage::AwaitPlatform));
        assert!(Stage::Review.can_transition_to(Stage::AwaitEmail));
        assert!(!Stage::Review.can_transition_to(Stage::AwaitPhone));
    }

    #[test]
    fn cancel_reachable_from_any_active_stage() {
        for stage in [
            Stage::StartDecision,
            Stage::AwaitPlatform,
            Stage::AwaitEmail,
            Stage::AwaitPhone,
            Stage::AwaitRegion,
            Stage::Review,
        ] {
            assert!(stage.can_transition_to(Stage::Cancelled), "{stage}");
        }
        assert!(!Stage::Cancelled.can_transition_to(Stage::Cancelled));
    }

    #[test]
    fn cancelled_is_the_only_terminal_stage() {
        assert!(Stage::Cancelled.is_terminal());
        assert!(!Stage::Review.is_terminal());
        assert!(!Stage::StartDecision.is_terminal());
    }
}
