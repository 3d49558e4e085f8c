//! Dialogue state machine states — one per session.

use serde::{Deserialize, Serialize};

/// Where the session is in the collection flow.
///
/// Forward collection is strictly linear: Idle → AwaitingSex →
/// AwaitingWeight → AwaitingHeight → AwaitingAge → AwaitingActivity →
/// AwaitingGoal → Complete. The "use existing profile" branch short-circuits
/// straight to Complete; restart returns to Idle from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    #[default]
    Idle,
    AwaitingSex,
    AwaitingWeight,
    AwaitingHeight,
    AwaitingAge,
    AwaitingActivity,
    AwaitingGoal,
    Complete,
}

impl DialogueState {
    /// States that consume raw text input.
    pub fn awaits_text(&self) -> bool {
        matches!(
            self,
            Self::AwaitingWeight | Self::AwaitingHeight | Self::AwaitingAge
        )
    }

    /// States that consume a choice-button press from the collection flow.
    pub fn awaits_choice(&self) -> bool {
        matches!(
            self,
            Self::AwaitingSex | Self::AwaitingActivity | Self::AwaitingGoal
        )
    }
}

impl std::fmt::Display for DialogueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::AwaitingSex => "awaiting_sex",
            Self::AwaitingWeight => "awaiting_weight",
            Self::AwaitingHeight => "awaiting_height",
            Self::AwaitingAge => "awaiting_age",
            Self::AwaitingActivity => "awaiting_activity",
            Self::AwaitingGoal => "awaiting_goal",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}
