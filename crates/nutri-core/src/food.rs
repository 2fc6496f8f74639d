use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{NutritionCompleteness, Provider, SourceTier};

/// One micronutrient figure with its unit (e.g. `{ value: 120.0, unit: "mg" }`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Micronutrient {
    pub value: f64,
    pub unit: String,
}

/// Blended trust signal attached to every resolved result.
///
/// Produced fresh per resolution and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConfidenceScore {
    pub score: f64,
    pub is_verified: bool,
    pub reasons: Vec<String>,
}

impl ConfidenceScore {
    /// Score carried by a result that has not been scored yet.
    #[must_use]
    pub const fn unscored() -> Self {
        Self {
            score: 0.0,
            is_verified: false,
            reasons: Vec::new(),
        }
    }

    /// Score of a user override: always 1.0 and verified.
    #[must_use]
    pub fn override_exempt() -> Self {
        Self {
            score: 1.0,
            is_verified: true,
            reasons: vec!["source_tier=override (user-maintained record, scoring skipped)".into()],
        }
    }
}

impl Default for ConfidenceScore {
    fn default() -> Self {
        Self::unscored()
    }
}

/// Provider-agnostic normalized nutrition record.
///
/// Calories are kcal, macros are grams, sodium is milligrams. Figures describe
/// one serving of `serving_amount` `serving_unit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CanonicalFoodResult {
    pub provider: Provider,
    /// Barcode; empty for search-only results.
    #[serde(default)]
    pub identifier: String,
    pub description: String,
    #[serde(default)]
    pub brand: String,
    pub serving_amount: f64,
    #[serde(default)]
    pub serving_unit: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    #[serde(default)]
    pub fiber_g: Option<f64>,
    #[serde(default)]
    pub sugar_g: Option<f64>,
    #[serde(default)]
    pub sodium_mg: Option<f64>,
    #[serde(default)]
    pub micronutrients: BTreeMap<String, Micronutrient>,
    /// Provider-internal id, 0 if unknown.
    #[serde(default)]
    pub source_id: i64,

    pub source_tier: SourceTier,
    #[serde(default)]
    pub exact_match: bool,
    pub nutrition_completeness: NutritionCompleteness,
    #[serde(default)]
    pub confidence: ConfidenceScore,

    /// Providers attempted to produce this result, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lookup_trail: Vec<Provider>,
    /// `"<provider>: <reason>"` for every candidate that failed along the way.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provider_failures: Vec<String>,
    /// Lower-ranked results describing the same item (search only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<CanonicalFoodResult>,
}

impl CanonicalFoodResult {
    /// Empty result for `provider`, tagged as a fresh provider fetch.
    #[must_use]
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            identifier: String::new(),
            description: String::new(),
            brand: String::new(),
            serving_amount: 0.0,
            serving_unit: String::new(),
            calories: 0.0,
            protein_g: 0.0,
            carbs_g: 0.0,
            fat_g: 0.0,
            fiber_g: None,
            sugar_g: None,
            sodium_mg: None,
            micronutrients: BTreeMap::new(),
            source_id: 0,
            source_tier: SourceTier::Provider,
            exact_match: false,
            nutrition_completeness: NutritionCompleteness::Unknown,
            confidence: ConfidenceScore::unscored(),
            lookup_trail: Vec::new(),
            provider_failures: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    /// Whether any nutrition figure (core, optional, or micronutrient) is non-zero.
    #[must_use]
    pub fn has_nutrition_signal(&self) -> bool {
        let core = [self.calories, self.protein_g, self.carbs_g, self.fat_g];
        let optional = [self.fiber_g, self.sugar_g, self.sodium_mg];
        core.iter().any(|v| *v > 0.0)
            || optional.iter().flatten().any(|v| *v > 0.0)
            || self.micronutrients.values().any(|m| m.value > 0.0)
    }

    /// Derive completeness from the current field values.
    #[must_use]
    pub fn compute_completeness(&self) -> NutritionCompleteness {
        if self.description.trim().is_empty() {
            return NutritionCompleteness::Unknown;
        }
        let serving_ok = self.serving_amount > 0.0 && !self.serving_unit.trim().is_empty();
        if serving_ok && self.has_nutrition_signal() {
            NutritionCompleteness::Complete
        } else {
            NutritionCompleteness::Partial
        }
    }

    /// Recompute and store `nutrition_completeness`.
    pub fn refresh_completeness(&mut self) {
        self.nutrition_completeness = self.compute_completeness();
    }

    /// Strip per-resolution metadata so the record can be cached or snapshotted.
    #[must_use]
    pub fn into_snapshot(mut self) -> Self {
        self.confidence = ConfidenceScore::unscored();
        self.lookup_trail.clear();
        self.provider_failures.clear();
        self.alternatives.clear();
        self
    }
}
