//! Tolerant parser for generation-service responses.
//!
//! The service is asked for a JSON object with a `menu` array, but models
//! wrap output in code fences, prepend prose, or return a bare array often
//! enough that the parser hunts for the JSON body instead of trusting the
//! envelope. A response that yields no usable day is a generation failure.

use serde_json::Value;

use crate::error::GenerationError;
use crate::plan::model::{DayPlan, MealSlot};

/// Parse raw generation output into an ordered day-plan sequence.
///
/// Days that are not JSON objects are skipped; an overall result with zero
/// days is an error so a partially garbled plan is never loaded.
pub fn parse_plan_response(raw: &str) -> Result<Vec<DayPlan>, GenerationError> {
    let body = extract_json_body(raw).ok_or_else(|| GenerationError::InvalidResponse {
        reason: "no JSON object or array found in response".into(),
    })?;

    let value: Value =
        serde_json::from_str(body).map_err(|e| GenerationError::InvalidResponse {
            reason: format!("invalid JSON: {e}"),
        })?;

    let menu = match &value {
        Value::Array(items) => items.as_slice(),
        Value::Object(obj) => obj
            .get("menu")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .ok_or_else(|| GenerationError::InvalidResponse {
                reason: "response object has no 'menu' array".into(),
            })?,
        _ => {
            return Err(GenerationError::InvalidResponse {
                reason: "response JSON is neither object nor array".into(),
            });
        }
    };

    let days: Vec<DayPlan> = menu
        .iter()
        .enumerate()
        .filter_map(|(i, item)| parse_day(item, i))
        .collect();

    if days.is_empty() {
        return Err(GenerationError::InvalidResponse {
            reason: "response contained no usable day plans".into(),
        });
    }
    Ok(days)
}

/// Strip code fences and surrounding prose; return the JSON body slice.
///
/// Whichever opener appears first decides the shape: a bare array starts
/// with `[` before any `{` of its day objects, while an object envelope
/// starts with `{` before the `menu` array's `[`.
fn extract_json_body(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();

    let close = match (trimmed.find('{'), trimmed.find('[')) {
        (Some(obj), Some(arr)) if arr < obj => ']',
        (Some(_), _) => '}',
        (None, Some(_)) => ']',
        (None, None) => return None,
    };
    let open = if close == '}' { '{' } else { '[' };

    let start = trimmed.find(open)?;
    let end = trimmed.rfind(close)?;
    (end > start).then(|| &trimmed[start..=end])
}

fn parse_day(item: &Value, index: usize) -> Option<DayPlan> {
    let obj = item.as_object()?;

    let label = obj
        .get("day")
        .and_then(value_as_text)
        .unwrap_or_else(|| format!("Day {}", index + 1));

    let mut day = DayPlan::new(label);
    day.calorie_target = obj.get("calories").and_then(value_as_calories);
    day.macro_summary = obj
        .get("macronutrients")
        .and_then(value_as_text)
        .unwrap_or_default();

    for slot in MealSlot::ALL {
        if let Some(content) = obj.get(slot.response_key()).and_then(value_as_text) {
            let content = content.trim().to_string();
            if !content.is_empty() {
                day.set_meal(slot, content);
            }
        }
    }
    Some(day)
}

/// Accept strings and numbers interchangeably for text fields.
fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Calories may arrive as a number or a string like "2100 kcal".
fn value_as_calories(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f.round() as u32),
        Value::String(s) => {
            let digits: String = s.chars().filter(char::is_ascii_digit).collect();
            digits.parse().ok()
        }
        _ => None,
    }
}
