//! User biometric profile — durable record plus in-progress draft.

pub mod calories;
pub mod model;

pub use calories::{activity_multiplier, compute_daily_calories};
pub use model::{ActivityLevel, DraftProfile, Goal, Profile, Sex};
