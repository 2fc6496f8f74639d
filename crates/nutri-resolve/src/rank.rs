//! Dedup/rank engine for search results.
//!
//! Results describing the same item (same canonical key) collapse into one
//! primary with the rest as `alternatives`. Ordering, both within a group and
//! across groups:
//!
//! 1. confidence score, descending
//! 2. nutrition completeness, descending
//! 3. provider preference (caller candidate order), ascending
//! 4. description, ascending (case-insensitive)

use std::cmp::Ordering;
use std::collections::HashMap;

use nutri_core::{CanonicalFoodResult, Provider};

/// Grouping key: normalized `description|brand`.
#[must_use]
pub fn canonical_key(food: &CanonicalFoodResult) -> String {
    format!("{}|{}", normalize(&food.description), normalize(&food.brand))
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect::<String>()
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn preference_index(provider: Provider, preference: &[Provider]) -> usize {
    preference
        .iter()
        .position(|p| *p == provider)
        .unwrap_or(preference.len())
}

/// Total order used for ranking; `Less` sorts first.
#[must_use]
pub fn compare(
    a: &CanonicalFoodResult,
    b: &CanonicalFoodResult,
    preference: &[Provider],
) -> Ordering {
    b.confidence
        .score
        .total_cmp(&a.confidence.score)
        .then_with(|| {
            b.nutrition_completeness
                .rank()
                .cmp(&a.nutrition_completeness.rank())
        })
        .then_with(|| {
            preference_index(a.provider, preference).cmp(&preference_index(b.provider, preference))
        })
        .then_with(|| {
            a.description
                .to_lowercase()
                .cmp(&b.description.to_lowercase())
        })
}

/// Group by canonical key and rank.
///
/// Each returned primary carries its group's other members, in rank order,
/// as `alternatives`. Alternatives never nest.
#[must_use]
pub fn dedup_and_rank(
    results: Vec<CanonicalFoodResult>,
    preference: &[Provider],
) -> Vec<CanonicalFoodResult> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<CanonicalFoodResult>> = HashMap::new();
    for mut food in results {
        food.alternatives.clear();
        let key = canonical_key(&food);
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(food);
    }

    let mut primaries: Vec<CanonicalFoodResult> = order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .filter_map(|mut members| {
            members.sort_by(|a, b| compare(a, b, preference));
            let mut members = members.into_iter();
            let mut primary = members.next()?;
            primary.alternatives = members.collect();
            Some(primary)
        })
        .collect();

    primaries.sort_by(|a, b| compare(a, b, preference));
    primaries
}

/// Apply the verified-only filter and the result limit.
#[must_use]
pub fn finalize(
    ranked: Vec<CanonicalFoodResult>,
    verified_only: bool,
    limit: usize,
) -> Vec<CanonicalFoodResult> {
    ranked
        .into_iter()
        .filter(|food| !verified_only || food.confidence.is_verified)
        .take(limit)
        .collect()
}
