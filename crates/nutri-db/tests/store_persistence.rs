//! Store integration tests
//!
//! - On-disk database survives a reopen
//! - libSQL and memory stores agree through the `FoodStore` trait

use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;

use nutri_core::cache::{CacheEntry, PurgeScope, SearchCacheEntry};
use nutri_core::overrides::OverrideRecord;
use nutri_core::{CanonicalFoodResult, Provider, SourceTier};
use nutri_db::{FoodStore, MemoryStore, NutriDb};

fn yogurt(provider: Provider) -> CanonicalFoodResult {
    let mut food = CanonicalFoodResult {
        identifier: "012345678905".into(),
        description: "Greek Yogurt".into(),
        brand: "Acme".into(),
        serving_amount: 170.0,
        serving_unit: "g".into(),
        calories: 100.0,
        protein_g: 17.0,
        carbs_g: 6.0,
        ..CanonicalFoodResult::new(provider)
    };
    food.refresh_completeness();
    food
}

fn record() -> OverrideRecord {
    let at = Utc.with_ymd_and_hms(2026, 1, 15, 8, 0, 0).unwrap();
    OverrideRecord {
        provider: Provider::Usda,
        barcode: "012345678905".into(),
        food: CanonicalFoodResult {
            source_tier: SourceTier::Override,
            exact_match: true,
            ..yogurt(Provider::Usda)
        },
        notes: String::new(),
        created_at: at,
        updated_at: at,
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reopened_database_keeps_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nutri.db");
    let path = path.to_str().unwrap();
    let now = Utc::now();

    {
        let db = NutriDb::open_local(path).await.unwrap();
        db.upsert_override(&record()).await.unwrap();
        let entry = CacheEntry::new(
            yogurt(Provider::OpenFoodFacts),
            "012345678905",
            "{\"status\":1}".into(),
            now,
            Duration::days(30),
        )
        .unwrap();
        db.put_cached_food(&entry).await.unwrap();
    }

    let db = NutriDb::open_local(path).await.unwrap();
    let stored = db
        .get_override(Provider::Usda, "012345678905")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, record());

    let cached = db
        .get_cached_food(Provider::OpenFoodFacts, "012345678905", now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cached.raw_payload, "{\"status\":1}");
    assert_eq!(cached.food.description, "Greek Yogurt");
}

// ---------------------------------------------------------------------------
// Trait parity
// ---------------------------------------------------------------------------

async fn exercise(store: &dyn FoodStore) -> Vec<String> {
    let now = Utc::now();
    let mut log = Vec::new();

    store.upsert_override(&record()).await.unwrap();
    log.push(format!(
        "overrides={}",
        store.list_overrides(None).await.unwrap().len()
    ));

    for provider in Provider::ALL {
        let entry = SearchCacheEntry::new(
            provider,
            "greek yogurt",
            10,
            vec![yogurt(provider)],
            String::new(),
            now,
            Duration::days(7),
        )
        .unwrap();
        store.put_cached_search(&entry).await.unwrap();
    }
    let listed = store.list_cached_searches(None, now).await.unwrap();
    log.push(
        listed
            .iter()
            .map(|s| format!("{}:{}:{}", s.provider, s.key, s.label))
            .collect::<Vec<_>>()
            .join(","),
    );

    let hit = store
        .get_cached_search(Provider::Usda, "greek yogurt", 10, now + Duration::days(7))
        .await
        .unwrap();
    log.push(format!("expired_hit={}", hit.is_some()));

    let removed = store
        .purge_cached_searches(&PurgeScope::Key("greek yogurt".into()))
        .await
        .unwrap();
    log.push(format!("purged={removed}"));

    let deleted = store
        .delete_override(Provider::Usda, "012345678905")
        .await
        .unwrap();
    log.push(format!("deleted={deleted}"));
    log
}

#[tokio::test]
async fn libsql_and_memory_stores_agree() {
    let db = NutriDb::open_local(":memory:").await.unwrap();
    let memory = MemoryStore::new();

    let from_db = exercise(&db).await;
    let from_memory = exercise(&memory).await;

    assert_eq!(from_db, from_memory);
    assert_eq!(from_db[0], "overrides=1");
    assert_eq!(
        from_db[1],
        "openfoodfacts:greek yogurt:1 results,upcitemdb:greek yogurt:1 results,usda:greek yogurt:1 results"
    );
    assert_eq!(from_db[2], "expired_hit=false");
    assert_eq!(from_db[3], "purged=3");
    assert_eq!(from_db[4], "deleted=true");
}
