//! User-maintained override records and their validation rules.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::Provider;
use crate::errors::CoreError;
use crate::food::{CanonicalFoodResult, Micronutrient};
use crate::identity::validate_barcode;

/// A user-owned replacement for whatever a provider says about a barcode.
///
/// Keyed by (provider, barcode). Never expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OverrideRecord {
    pub provider: Provider,
    pub barcode: String,
    pub food: CanonicalFoodResult,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validate the nutrition snapshot of an override.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] naming the first offending field.
pub fn validate_override_food(food: &CanonicalFoodResult) -> Result<(), CoreError> {
    if food.description.trim().is_empty() {
        return Err(CoreError::validation("override description is required"));
    }
    if !(food.serving_amount.is_finite() && food.serving_amount > 0.0) {
        return Err(CoreError::validation(format!(
            "override serving amount must be > 0, got {}",
            food.serving_amount
        )));
    }
    if food.serving_unit.trim().is_empty() {
        return Err(CoreError::validation("override serving unit is required"));
    }

    let figures = [
        ("calories", Some(food.calories)),
        ("protein_g", Some(food.protein_g)),
        ("carbs_g", Some(food.carbs_g)),
        ("fat_g", Some(food.fat_g)),
        ("fiber_g", food.fiber_g),
        ("sugar_g", food.sugar_g),
        ("sodium_mg", food.sodium_mg),
    ];
    for (name, value) in figures {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(CoreError::validation(format!(
                    "override {name} must be a non-negative number, got {v}"
                )));
            }
        }
    }

    validate_micronutrients(&food.micronutrients)
}

/// Validate micronutrient names and figures.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] for a non-snake_case key, a missing unit,
/// or a negative value.
pub fn validate_micronutrients(
    micros: &BTreeMap<String, Micronutrient>,
) -> Result<(), CoreError> {
    for (name, micro) in micros {
        if !is_snake_case(name) {
            return Err(CoreError::validation(format!(
                "micronutrient key '{name}' must be lowercase snake_case"
            )));
        }
        if micro.unit.trim().is_empty() {
            return Err(CoreError::validation(format!(
                "micronutrient '{name}' requires a unit"
            )));
        }
        if !micro.value.is_finite() || micro.value < 0.0 {
            return Err(CoreError::validation(format!(
                "micronutrient '{name}' must be a non-negative number, got {}",
                micro.value
            )));
        }
    }
    Ok(())
}

/// Parse a JSON object of `name -> {value, unit}` into validated micronutrients.
///
/// Malformed JSON and entries without a unit are rejected rather than dropped.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] if the JSON does not parse or fails
/// [`validate_micronutrients`].
pub fn parse_micronutrients_json(
    json: &str,
) -> Result<BTreeMap<String, Micronutrient>, CoreError> {
    if json.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let micros: BTreeMap<String, Micronutrient> = serde_json::from_str(json)
        .map_err(|e| CoreError::validation(format!("invalid micronutrient JSON: {e}")))?;
    validate_micronutrients(&micros)?;
    Ok(micros)
}

/// Validate the key of an override.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] if the barcode shape is invalid.
pub fn validate_override_key(barcode: &str) -> Result<String, CoreError> {
    validate_barcode(barcode).map(str::to_string)
}

fn is_snake_case(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    starts_ok
        && !name.ends_with('_')
        && !name.contains("__")
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
