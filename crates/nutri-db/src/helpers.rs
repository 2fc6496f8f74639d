//! Row-to-entity parsing helpers.
//!
//! The override and barcode-cache tables share one run of food columns
//! ([`FOOD_COLUMNS`]). These helpers convert that run to and from
//! [`CanonicalFoodResult`] and handle timestamp and enum columns.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use nutri_core::cache::PurgeScope;
use nutri_core::{CanonicalFoodResult, Micronutrient, Provider};

use crate::error::DatabaseError;

/// Food columns shared by `food_overrides` and `barcode_cache`, in order.
pub const FOOD_COLUMNS: &str = "description, brand, serving_amount, serving_unit, \
     calories, protein_g, carbs_g, fat_g, fiber_g, sugar_g, sodium_mg, micronutrients, source_id";

/// Number of columns in [`FOOD_COLUMNS`].
pub const FOOD_COLUMN_COUNT: i32 = 13;

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 (`"2026-02-09T14:30:00+00:00"`) and `SQLite`'s default
/// format (`"2026-02-09 14:30:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse a TEXT column holding a [`Provider`] name.
///
/// # Errors
///
/// Returns `DatabaseError::InvalidState` for an unknown provider.
pub fn parse_provider(s: &str) -> Result<Provider, DatabaseError> {
    s.parse()
        .map_err(|e| DatabaseError::InvalidState(format!("provider column: {e}")))
}

/// Read the food column run starting at `start` into a result for `provider`.
///
/// Completeness is recomputed from the stored figures.
///
/// # Errors
///
/// Returns `DatabaseError` if a column read fails or the micronutrient JSON
/// does not parse.
pub fn read_food(
    row: &libsql::Row,
    start: i32,
    provider: Provider,
) -> Result<CanonicalFoodResult, DatabaseError> {
    let micronutrients: BTreeMap<String, Micronutrient> =
        serde_json::from_str(&row.get::<String>(start + 11)?)?;
    let mut food = CanonicalFoodResult {
        description: row.get::<String>(start)?,
        brand: row.get::<String>(start + 1)?,
        serving_amount: row.get::<f64>(start + 2)?,
        serving_unit: row.get::<String>(start + 3)?,
        calories: row.get::<f64>(start + 4)?,
        protein_g: row.get::<f64>(start + 5)?,
        carbs_g: row.get::<f64>(start + 6)?,
        fat_g: row.get::<f64>(start + 7)?,
        fiber_g: row.get::<Option<f64>>(start + 8)?,
        sugar_g: row.get::<Option<f64>>(start + 9)?,
        sodium_mg: row.get::<Option<f64>>(start + 10)?,
        micronutrients,
        source_id: row.get::<i64>(start + 12)?,
        ..CanonicalFoodResult::new(provider)
    };
    food.refresh_completeness();
    Ok(food)
}

/// Bind values for [`FOOD_COLUMNS`], in column order.
///
/// # Errors
///
/// Returns `DatabaseError::Serde` if the micronutrient map cannot be encoded.
pub fn food_values(food: &CanonicalFoodResult) -> Result<Vec<libsql::Value>, DatabaseError> {
    Ok(vec![
        food.description.as_str().into(),
        food.brand.as_str().into(),
        food.serving_amount.into(),
        food.serving_unit.as_str().into(),
        food.calories.into(),
        food.protein_g.into(),
        food.carbs_g.into(),
        food.fat_g.into(),
        food.fiber_g.into(),
        food.sugar_g.into(),
        food.sodium_mg.into(),
        serde_json::to_string(&food.micronutrients)?.into(),
        food.source_id.into(),
    ])
}

/// `?{start}, ?{start+1}, …` placeholders for `count` parameters.
#[must_use]
pub fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `WHERE` clause and bind values selecting the rows a purge removes.
///
/// `key_column` names the barcode or query column of the table.
#[must_use]
pub fn purge_filter(scope: &PurgeScope, key_column: &str) -> (String, Vec<libsql::Value>) {
    match scope {
        PurgeScope::All => (String::new(), Vec::new()),
        PurgeScope::Provider(p) => ("WHERE provider = ?1".to_string(), vec![p.as_str().into()]),
        PurgeScope::Key(k) => (format!("WHERE {key_column} = ?1"), vec![k.as_str().into()]),
        PurgeScope::ProviderKey(p, k) => (
            format!("WHERE provider = ?1 AND {key_column} = ?2"),
            vec![p.as_str().into(), k.as_str().into()],
        ),
    }
}
