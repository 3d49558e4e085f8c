//! Closed vocabulary of button callback tokens.

use std::str::FromStr;

use crate::profile::{ActivityLevel, Goal, Sex};

/// Every button token the bot can emit or receive.
///
/// Unrecognized wire tokens fail to parse and are dropped at the edge, so
/// the machine only ever sees this closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceToken {
    /// Start (or restart) the collection flow.
    StartProfile,
    /// Reuse the stored profile instead of re-answering six questions.
    UseExisting,
    /// Request the pre-generation profile recap.
    GenerateMenu,
    /// Confirm the recap and actually call the generation service.
    ConfirmGenerate,
    /// Compute and persist the daily calorie target.
    Calculate,
    Sex(Sex),
    Activity(ActivityLevel),
    Goal(Goal),
    NextDay,
    PrevDay,
    /// Reset the session back to the main menu.
    MainMenu,
    /// Inert token used for the page-progress indicator button.
    Noop,
}

impl ChoiceToken {
    pub fn as_token(&self) -> String {
        match self {
            Self::StartProfile => "fill_in".into(),
            Self::UseExisting => "use_existing".into(),
            Self::GenerateMenu => "generate_menu".into(),
            Self::ConfirmGenerate => "generate_confirmed".into(),
            Self::Calculate => "calculate".into(),
            Self::Sex(s) => format!("sex_{}", s.as_token()),
            Self::Activity(a) => format!("activity_{}", a.as_token()),
            Self::Goal(g) => format!("goal_{}", g.as_token()),
            Self::NextDay => "menu_next".into(),
            Self::PrevDay => "menu_prev".into(),
            Self::MainMenu => "back_to_main".into(),
            Self::Noop => "noop".into(),
        }
    }
}

/// Error for tokens outside the closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized choice token: {0}")]
pub struct UnknownToken(pub String);

impl FromStr for ChoiceToken {
    type Err = UnknownToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix("sex_") {
            return Sex::from_token(rest)
                .map(Self::Sex)
                .ok_or_else(|| UnknownToken(s.to_string()));
        }
        if let Some(rest) = s.strip_prefix("activity_") {
            return ActivityLevel::from_token(rest)
                .map(Self::Activity)
                .ok_or_else(|| UnknownToken(s.to_string()));
        }
        if let Some(rest) = s.strip_prefix("goal_") {
            return Goal::from_token(rest)
                .map(Self::Goal)
                .ok_or_else(|| UnknownToken(s.to_string()));
        }
        match s {
            "fill_in" => Ok(Self::StartProfile),
            "use_existing" => Ok(Self::UseExisting),
            "generate_menu" => Ok(Self::GenerateMenu),
            "generate_confirmed" => Ok(Self::ConfirmGenerate),
            "calculate" => Ok(Self::Calculate),
            "menu_next" => Ok(Self::NextDay),
            "menu_prev" => Ok(Self::PrevDay),
            "back_to_main" => Ok(Self::MainMenu),
            "noop" => Ok(Self::Noop),
            _ => Err(UnknownToken(s.to_string())),
        }
    }
}
