//! Prompt builders for the meal-plan generation call.

use crate::profile::Profile;

/// System instructions sent with every generation request.
pub fn system_instructions() -> &'static str {
    "You are a professional nutritionist creating personalized 7-day meal plans. \
     Create a JSON response with a 'menu' key containing an array of 7 day objects. \
     Each day object must have: day, calories, macronutrients, breakfast, snack1, \
     lunch, snack2, dinner. Make meals practical, detailed with portions and \
     calories, balanced and realistic for home cooking. Adjust calories based on \
     the goal: a moderate deficit for weight loss, a surplus for weight gain. \
     RESPOND ONLY WITH VALID JSON - NO OTHER TEXT."
}

/// User prompt built from a completed profile.
pub fn plan_request(profile: &Profile, daily_calories: u32) -> String {
    format!(
        "Create a meal plan for:\n\
         Sex: {}\n\
         Age: {}\n\
         Height: {} cm\n\
         Weight: {} kg\n\
         Activity: {}\n\
         Goal: {}\n\
         Target calories: {daily_calories}",
        profile.sex.label(),
        profile.age_years,
        profile.height_cm,
        profile.weight_kg,
        profile.activity.label().to_lowercase(),
        profile.goal.label().to_lowercase(),
    )
}
