//! Profile value types — sex, activity tier, goal, and the draft/finalized
//! profile pair.
//!
//! A `Profile` is only ever constructed fully populated; partially collected
//! input lives in a `DraftProfile` until every field is present.

use serde::{Deserialize, Serialize};

/// Upper bound for weight input (kg).
pub const MAX_WEIGHT_KG: f64 = 500.0;
/// Upper bound for height input (cm).
pub const MAX_HEIGHT_CM: f64 = 250.0;
/// Upper bound for age input (years).
pub const MAX_AGE_YEARS: u32 = 120;

/// Biological sex, as used by the Mifflin–St Jeor formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_token(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_token())
    }
}

/// Activity tier, ordered by multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Minimal,
    Light,
    Moderate,
    High,
    Extreme,
}

impl ActivityLevel {
    /// All tiers, in multiplier order.
    pub const ALL: [ActivityLevel; 5] = [
        Self::Minimal,
        Self::Light,
        Self::Moderate,
        Self::High,
        Self::Extreme,
    ];

    /// Fixed design constant per tier, not configurable per call.
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Minimal => 1.2,
            Self::Light => 1.375,
            Self::Moderate => 1.55,
            Self::High => 1.725,
            Self::Extreme => 1.9,
        }
    }

    pub fn as_token(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Extreme => "extreme",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "minimal" => Some(Self::Minimal),
            "light" => Some(Self::Light),
            "moderate" => Some(Self::Moderate),
            "high" => Some(Self::High),
            "extreme" => Some(Self::Extreme),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Minimal => "Minimal",
            Self::Light => "Light",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::Extreme => "Extreme",
        }
    }

    /// Short explanation shown next to the tier button.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Minimal => "little to no exercise",
            Self::Light => "light exercise 1-3 days/week",
            Self::Moderate => "moderate exercise 3-5 days/week",
            Self::High => "hard exercise 6-7 days/week",
            Self::Extreme => "very hard exercise or a physical job",
        }
    }
}

impl std::fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_token())
    }
}

/// What the user wants the meal plan to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    Maintain,
    Lose,
    Gain,
}

impl Goal {
    pub const ALL: [Goal; 3] = [Self::Maintain, Self::Lose, Self::Gain];

    pub fn as_token(&self) -> &'static str {
        match self {
            Self::Maintain => "maintain",
            Self::Lose => "lose",
            Self::Gain => "gain",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "maintain" => Some(Self::Maintain),
            "lose" => Some(Self::Lose),
            "gain" => Some(Self::Gain),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Maintain => "Maintain weight",
            Self::Lose => "Lose weight",
            Self::Gain => "Gain weight",
        }
    }
}

impl std::fmt::Display for Goal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_token())
    }
}

/// A fully populated, durable profile record.
///
/// Immutable once written: a new completion appends a new record, it never
/// mutates an old one. `calories` stays `None` until computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub sex: Sex,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age_years: u32,
    pub activity: ActivityLevel,
    pub goal: Goal,
    pub calories: Option<u32>,
}

impl Profile {
    /// One-line recap shown before generation and after lookup.
    pub fn summary(&self) -> String {
        format!(
            "{}, {} years, {} kg, {} cm, activity: {}, goal: {}",
            self.sex.label(),
            self.age_years,
            self.weight_kg,
            self.height_cm,
            self.activity.label().to_lowercase(),
            self.goal.label().to_lowercase(),
        )
    }
}

/// In-progress profile under construction by the dialogue flow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftProfile {
    pub sex: Option<Sex>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub age_years: Option<u32>,
    pub activity: Option<ActivityLevel>,
    pub goal: Option<Goal>,
}

impl DraftProfile {
    /// All six input fields present.
    pub fn is_complete(&self) -> bool {
        self.sex.is_some()
            && self.weight_kg.is_some()
            && self.height_cm.is_some()
            && self.age_years.is_some()
            && self.activity.is_some()
            && self.goal.is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Convert to a durable `Profile` if complete. Calories are not set here;
    /// the calculator fills them in before the record is appended.
    pub fn finalize(&self, user_id: &str) -> Option<Profile> {
        Some(Profile {
            user_id: user_id.to_string(),
            sex: self.sex?,
            weight_kg: self.weight_kg?,
            height_cm: self.height_cm?,
            age_years: self.age_years?,
            activity: self.activity?,
            goal: self.goal?,
            calories: None,
        })
    }
}

impl From<&Profile> for DraftProfile {
    /// Wholesale replacement used by the "use existing profile" branch.
    fn from(p: &Profile) -> Self {
        Self {
            sex: Some(p.sex),
            weight_kg: Some(p.weight_kg),
            height_cm: Some(p.height_cm),
            age_years: Some(p.age_years),
            activity: Some(p.activity),
            goal: Some(p.goal),
        }
    }
}
