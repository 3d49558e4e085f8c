//! One day of a generated meal plan.

use serde::{Deserialize, Serialize};

/// Fixed meal slots, in rendering order. Always exactly five per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealSlot {
    Breakfast,
    MorningSnack,
    Lunch,
    AfternoonSnack,
    Dinner,
}

impl MealSlot {
    pub const ALL: [MealSlot; 5] = [
        Self::Breakfast,
        Self::MorningSnack,
        Self::Lunch,
        Self::AfternoonSnack,
        Self::Dinner,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Breakfast => "Breakfast",
            Self::MorningSnack => "Morning snack",
            Self::Lunch => "Lunch",
            Self::AfternoonSnack => "Afternoon snack",
            Self::Dinner => "Dinner",
        }
    }

    /// Key used by the generation service's response format.
    pub fn response_key(&self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::MorningSnack => "snack1",
            Self::Lunch => "lunch",
            Self::AfternoonSnack => "snack2",
            Self::Dinner => "dinner",
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::Breakfast => 0,
            Self::MorningSnack => 1,
            Self::Lunch => 2,
            Self::AfternoonSnack => 3,
            Self::Dinner => 4,
        }
    }
}

/// One day's worth of a generated plan.
///
/// The meal array is fixed-size: an empty slot keeps its position in the
/// data but is omitted from rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub label: String,
    pub calorie_target: Option<u32>,
    pub macro_summary: String,
    meals: [String; 5],
}

impl DayPlan {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            calorie_target: None,
            macro_summary: String::new(),
            meals: Default::default(),
        }
    }

    pub fn set_meal(&mut self, slot: MealSlot, content: impl Into<String>) {
        self.meals[slot.index()] = content.into();
    }

    /// Content for a slot, or `None` when the slot is empty.
    pub fn meal(&self, slot: MealSlot) -> Option<&str> {
        let content = self.meals[slot.index()].as_str();
        (!content.is_empty()).then_some(content)
    }

    /// Whether any slot has content.
    pub fn has_meals(&self) -> bool {
        MealSlot::ALL.iter().any(|s| self.meal(*s).is_some())
    }

    /// Render the day as a chat message body.
    pub fn render(&self) -> String {
        let mut out = format!("📅 {}\n", self.label);
        match self.calorie_target {
            Some(cal) => out.push_str(&format!("🔥 {cal} calories\n")),
            None => out.push_str("🔥 calories: n/a\n"),
        }
        if !self.macro_summary.is_empty() {
            out.push_str(&format!("📊 {}\n", self.macro_summary));
        }
        for slot in MealSlot::ALL {
            if let Some(content) = self.meal(slot) {
                out.push_str(&format!("\n{}:\n{}\n", slot.display_name(), content));
            }
        }
        out
    }
}
