//! Shared test utilities for nutri-db unit tests.

pub(crate) mod helpers {
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};
    use nutri_core::overrides::OverrideRecord;
    use nutri_core::{CanonicalFoodResult, Micronutrient, Provider, SourceTier};

    use crate::NutriDb;

    /// Fresh in-memory database with migrations applied.
    pub async fn test_db() -> NutriDb {
        NutriDb::open_local(":memory:").await.unwrap()
    }

    /// A complete 170 g yogurt-like result.
    pub fn food(provider: Provider, description: &str) -> CanonicalFoodResult {
        let mut food = CanonicalFoodResult {
            description: description.to_string(),
            brand: "Acme".to_string(),
            serving_amount: 170.0,
            serving_unit: "g".to_string(),
            calories: 100.0,
            protein_g: 17.0,
            carbs_g: 6.0,
            fat_g: 0.0,
            sodium_mg: Some(60.0),
            micronutrients: BTreeMap::from([(
                "calcium".to_string(),
                Micronutrient {
                    value: 187.0,
                    unit: "mg".to_string(),
                },
            )]),
            source_id: 2_046_583,
            ..CanonicalFoodResult::new(provider)
        };
        food.refresh_completeness();
        food
    }

    pub fn override_record(provider: Provider, barcode: &str, description: &str) -> OverrideRecord {
        let created = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let mut item = food(provider, description);
        item.identifier = barcode.to_string();
        item.source_tier = SourceTier::Override;
        item.exact_match = true;
        OverrideRecord {
            provider,
            barcode: barcode.to_string(),
            food: item,
            notes: "weighed at home".to_string(),
            created_at: created,
            updated_at: created,
        }
    }
}
