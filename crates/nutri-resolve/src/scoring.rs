//! Confidence scoring.
//!
//! `score = 0.45·provider_trust + 0.25·nutrition_quality
//!        + 0.15·serving_quality + 0.15·identity_quality`,
//! clamped to [0, 1] and rounded to three decimals. The score is an API
//! contract: the weights, tiers, and reason strings below must stay stable.
//!
//! Overrides never reach this module; they short-circuit with
//! [`ConfidenceScore::override_exempt`].

use std::collections::HashSet;

use nutri_core::{CanonicalFoodResult, ConfidenceScore, Provider};

pub const WEIGHT_PROVIDER: f64 = 0.45;
pub const WEIGHT_NUTRITION: f64 = 0.25;
pub const WEIGHT_SERVING: f64 = 0.15;
pub const WEIGHT_IDENTITY: f64 = 0.15;

/// Default verification threshold.
pub const DEFAULT_THRESHOLD: f64 = 0.80;

/// Minimum identity quality for a search result to be verified.
pub const SEARCH_IDENTITY_GUARD: f64 = 0.70;

/// How the result was identified.
#[derive(Debug, Clone, Copy)]
pub enum Identity<'a> {
    /// Looked up by barcode.
    Barcode,
    /// Found by free-text search for this query.
    Search(&'a str),
}

/// Fixed per-provider trust.
#[must_use]
pub const fn provider_trust(provider: Provider) -> f64 {
    match provider {
        Provider::Usda => 0.90,
        Provider::OpenFoodFacts => 0.75,
        Provider::UpcItemDb => 0.60,
    }
}

/// Nutrition quality tier and its note.
#[must_use]
pub fn nutrition_quality(food: &CanonicalFoodResult) -> (f64, &'static str) {
    let macros = [food.protein_g, food.carbs_g, food.fat_g]
        .iter()
        .filter(|v| **v > 0.0)
        .count();
    let has_calories = food.calories > 0.0;
    if has_calories && macros == 3 {
        (1.0, "calories and all macros")
    } else if has_calories && macros >= 2 {
        (0.7, "calories and 2 macros")
    } else if food.has_nutrition_signal() {
        (0.4, "partial nutrition")
    } else {
        (0.2, "no nutrition data")
    }
}

/// Serving quality tier and its note.
#[must_use]
pub fn serving_quality(food: &CanonicalFoodResult) -> (f64, &'static str) {
    let has_amount = food.serving_amount > 0.0;
    let has_unit = !food.serving_unit.trim().is_empty();
    match (has_amount, has_unit) {
        (true, true) => (1.0, "amount and unit"),
        (true, false) | (false, true) => (0.5, "amount or unit only"),
        (false, false) => (0.0, "no serving"),
    }
}

/// Identity quality for a barcode lookup.
#[must_use]
pub fn barcode_identity(food: &CanonicalFoodResult) -> (f64, &'static str) {
    if food.exact_match {
        (1.0, "exact barcode match")
    } else if food.source_id != 0 {
        (0.8, "provider id, barcode not confirmed")
    } else {
        (0.5, "barcode not confirmed")
    }
}

/// Identity quality for a search hit.
///
/// Overlap is the fraction of query tokens present in the description. Only
/// a brand-token match unlocks the upper tiers; everything else floors at 0.4.
#[must_use]
pub fn search_identity(food: &CanonicalFoodResult, query: &str) -> (f64, String) {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return (0.4, "empty query".to_string());
    }
    let description: HashSet<String> = tokenize(&food.description).into_iter().collect();
    let brand: HashSet<String> = tokenize(&food.brand).into_iter().collect();

    let shared = query_tokens
        .iter()
        .filter(|t| description.contains(*t))
        .count();
    #[allow(clippy::cast_precision_loss)]
    let overlap = shared as f64 / query_tokens.len() as f64;
    let brand_match = query_tokens.iter().any(|t| brand.contains(t));

    let value = if overlap >= 0.75 && brand_match {
        1.0
    } else if overlap >= 0.50 && brand_match {
        0.7
    } else {
        0.4
    };
    let brand_note = if brand_match { "brand match" } else { "no brand match" };
    (value, format!("overlap={overlap:.2}, {brand_note}"))
}

/// Lowercase alphanumeric tokens, deduplicated in first-seen order.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let mut seen = HashSet::new();
    cleaned
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Score `food` against `threshold`.
#[must_use]
pub fn score(
    food: &CanonicalFoodResult,
    identity: Identity<'_>,
    threshold: f64,
) -> ConfidenceScore {
    let trust = provider_trust(food.provider);
    let (nutrition, nutrition_note) = nutrition_quality(food);
    let (serving, serving_note) = serving_quality(food);
    let (identity_value, identity_note) = match identity {
        Identity::Barcode => {
            let (v, note) = barcode_identity(food);
            (v, note.to_string())
        }
        Identity::Search(query) => search_identity(food, query),
    };

    let raw = WEIGHT_IDENTITY.mul_add(
        identity_value,
        WEIGHT_SERVING.mul_add(
            serving,
            WEIGHT_NUTRITION.mul_add(nutrition, WEIGHT_PROVIDER * trust),
        ),
    );
    let score = round3(raw.clamp(0.0, 1.0));

    let mut reasons = vec![
        format!("provider_trust={trust:.3} ({})", food.provider),
        format!("nutrition_quality={nutrition:.3} ({nutrition_note})"),
        format!("serving_quality={serving:.3} ({serving_note})"),
        format!("identity_quality={identity_value:.3} ({identity_note})"),
    ];

    let mut is_verified = score >= threshold;
    if let Identity::Search(_) = identity {
        let guard_ok = identity_value >= SEARCH_IDENTITY_GUARD;
        reasons.push(format!(
            "identity_guard={SEARCH_IDENTITY_GUARD:.3} ({})",
            if guard_ok { "passed" } else { "failed" }
        ));
        is_verified &= guard_ok;
    }
    reasons.push(format!(
        "threshold={threshold:.3} ({})",
        if is_verified { "verified" } else { "unverified" }
    ));

    ConfidenceScore {
        score,
        is_verified,
        reasons,
    }
}

/// Score a barcode lookup result.
#[must_use]
pub fn score_barcode(food: &CanonicalFoodResult, threshold: f64) -> ConfidenceScore {
    score(food, Identity::Barcode, threshold)
}

/// Score a search hit for `query`.
#[must_use]
pub fn score_search(food: &CanonicalFoodResult, query: &str, threshold: f64) -> ConfidenceScore {
    score(food, Identity::Search(query), threshold)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
