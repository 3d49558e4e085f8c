//! Numeric input validation for the collection flow.
//!
//! Failures here are recoverable by design: the session stays in the same
//! state and the user is re-prompted. They are plain values consumed by the
//! machine, never escalated through the error chain.

use crate::profile::model::{MAX_AGE_YEARS, MAX_HEIGHT_CM, MAX_WEIGHT_KG};

/// A recoverable validation failure for one numeric input.
///
/// Parse and range failures are distinguished only for user messaging; the
/// machine treats both identically (re-prompt, no state change).
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationFailure {
    NotANumber { field: &'static str },
    OutOfRange { field: &'static str, max: f64 },
}

impl ValidationFailure {
    /// Corrective prompt shown to the user.
    pub fn prompt(&self) -> String {
        match self {
            Self::NotANumber { field } => {
                format!("That doesn't look like a number. Please enter your {field} again.")
            }
            Self::OutOfRange { field, max } => {
                format!("Please enter a {field} between 0 and {max}.")
            }
        }
    }
}

/// Parse weight in kg: a float in (0, 500].
pub fn parse_weight(input: &str) -> Result<f64, ValidationFailure> {
    parse_bounded_float(input, "weight", MAX_WEIGHT_KG)
}

/// Parse height in cm: a float in (0, 250].
pub fn parse_height(input: &str) -> Result<f64, ValidationFailure> {
    parse_bounded_float(input, "height", MAX_HEIGHT_CM)
}

/// Parse age in years: an integer in (0, 120].
pub fn parse_age(input: &str) -> Result<u32, ValidationFailure> {
    let field = "age";
    // Parse through i64 so negative input classifies as out-of-range, not
    // as a parse failure.
    let value: i64 = input
        .trim()
        .parse()
        .map_err(|_| ValidationFailure::NotANumber { field })?;
    if value <= 0 || value > i64::from(MAX_AGE_YEARS) {
        return Err(ValidationFailure::OutOfRange {
            field,
            max: f64::from(MAX_AGE_YEARS),
        });
    }
    Ok(value as u32)
}

fn parse_bounded_float(
    input: &str,
    field: &'static str,
    max: f64,
) -> Result<f64, ValidationFailure> {
    let value: f64 = input
        .trim()
        .parse()
        .map_err(|_| ValidationFailure::NotANumber { field })?;
    // "NaN" and "inf" parse successfully but are not usable measurements.
    if !value.is_finite() {
        return Err(ValidationFailure::NotANumber { field });
    }
    if value <= 0.0 || value > max {
        return Err(ValidationFailure::OutOfRange { field, max });
    }
    Ok(value)
}
