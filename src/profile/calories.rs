//! Daily calorie target — Mifflin–St Jeor basal metabolic rate times an
//! activity multiplier.

use super::model::{ActivityLevel, Profile, Sex};

/// Basal metabolic rate for the given biometrics.
pub fn basal_metabolic_rate(sex: Sex, weight_kg: f64, height_cm: f64, age_years: u32) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age_years);
    match sex {
        Sex::Male => base + 5.0,
        Sex::Female => base - 161.0,
    }
}

/// Multiplier for an optionally-known activity tier.
///
/// A missing tier falls back to the minimal multiplier instead of failing.
pub fn activity_multiplier(level: Option<ActivityLevel>) -> f64 {
    level.unwrap_or(ActivityLevel::Minimal).multiplier()
}

/// Daily calorie target, rounded to the nearest whole calorie.
///
/// Deterministic: same profile in, same number out.
pub fn compute_daily_calories(profile: &Profile) -> u32 {
    let bmr = basal_metabolic_rate(
        profile.sex,
        profile.weight_kg,
        profile.height_cm,
        profile.age_years,
    );
    (bmr * activity_multiplier(Some(profile.activity))).round() as u32
}
