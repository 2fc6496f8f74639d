//! Fallback orchestration and search
//!
//! - Barcode fallback stops at the first success and records the trail
//! - Terminal errors are not retried on later candidates
//! - Search visits every candidate, skips failures, dedups and ranks
//! - Search cache keys on the normalized query and limit

mod support;

use std::sync::atomic::Ordering;

use pretty_assertions::assert_eq;

use nutri_core::cache::PurgeRequest;
use nutri_core::{CanonicalFoodResult, Provider, SourceTier};
use nutri_providers::ProviderSet;
use nutri_resolve::{ProviderCandidate, ResolveError, SearchOptions};

use support::{Behavior, FakeProvider, ManualClock, YOGURT_BARCODE, food, greek_yogurt, resolver};

fn candidates(providers: &[Provider]) -> Vec<ProviderCandidate> {
    providers.iter().copied().map(ProviderCandidate::new).collect()
}

// ---------------------------------------------------------------------------
// Barcode fallback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn falls_back_to_next_provider() {
    let usda = FakeProvider::failing(Provider::Usda, Behavior::NotFound);
    let off = FakeProvider::answering(greek_yogurt(Provider::OpenFoodFacts));
    let upc = FakeProvider::answering(greek_yogurt(Provider::UpcItemDb));
    let upc_calls = upc.calls();
    let resolver = resolver(
        ProviderSet::new().with(usda).with(off).with(upc),
        ManualClock::new(),
    );

    let food = resolver
        .lookup_barcode_with_fallback(
            YOGURT_BARCODE,
            &candidates(&[Provider::Usda, Provider::OpenFoodFacts, Provider::UpcItemDb]),
        )
        .await
        .unwrap();

    assert_eq!(food.provider, Provider::OpenFoodFacts);
    assert_eq!(
        food.lookup_trail,
        vec![Provider::Usda, Provider::OpenFoodFacts]
    );
    assert_eq!(food.provider_failures.len(), 1);
    assert!(food.provider_failures[0].starts_with("usda: "));
    assert_eq!(upc_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn first_success_has_single_entry_trail() {
    let resolver = resolver(
        ProviderSet::new().with(FakeProvider::answering(greek_yogurt(Provider::Usda))),
        ManualClock::new(),
    );
    let food = resolver
        .lookup_barcode_with_fallback(
            YOGURT_BARCODE,
            &candidates(&[Provider::Usda, Provider::OpenFoodFacts]),
        )
        .await
        .unwrap();
    assert_eq!(food.lookup_trail, vec![Provider::Usda]);
    assert!(food.provider_failures.is_empty());
}

#[tokio::test]
async fn all_failures_are_aggregated() {
    let resolver = resolver(
        ProviderSet::new()
            .with(FakeProvider::failing(Provider::Usda, Behavior::ServerError))
            .with(FakeProvider::failing(
                Provider::OpenFoodFacts,
                Behavior::NotFound,
            )),
        ManualClock::new(),
    );
    let err = resolver
        .lookup_barcode_with_fallback(
            YOGURT_BARCODE,
            &candidates(&[Provider::Usda, Provider::OpenFoodFacts]),
        )
        .await
        .unwrap_err();

    match err {
        ResolveError::AllProvidersFailed { failures } => {
            assert_eq!(failures.len(), 2);
            assert_eq!(failures[0], "usda: API error (503): service unavailable");
            assert!(failures[1].starts_with("openfoodfacts: no matching item"));
        }
        other => panic!("expected AllProvidersFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_candidate_list_is_invalid() {
    let resolver = resolver(ProviderSet::new(), ManualClock::new());
    let err = resolver
        .lookup_barcode_with_fallback(YOGURT_BARCODE, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::InputValidation(_)));

    let err = resolver
        .search_foods_with_fallback("yogurt", &[], &SearchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::InputValidation(_)));
}

#[tokio::test]
async fn invalid_barcode_is_not_retried() {
    let usda = FakeProvider::answering(greek_yogurt(Provider::Usda));
    let calls = usda.calls();
    let resolver = resolver(ProviderSet::new().with(usda), ManualClock::new());
    let err = resolver
        .lookup_barcode_with_fallback("12-34", &candidates(&[Provider::Usda]))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::InputValidation(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn override_on_later_candidate_is_found() {
    let resolver = resolver(
        ProviderSet::new().with(FakeProvider::failing(Provider::Usda, Behavior::NotFound)),
        ManualClock::new(),
    );
    resolver
        .set_override(
            Provider::UpcItemDb,
            YOGURT_BARCODE,
            greek_yogurt(Provider::UpcItemDb),
            "",
        )
        .await
        .unwrap();

    let food = resolver
        .lookup_barcode_with_fallback(
            YOGURT_BARCODE,
            &candidates(&[Provider::Usda, Provider::UpcItemDb]),
        )
        .await
        .unwrap();
    assert_eq!(food.source_tier, SourceTier::Override);
    assert_eq!(food.lookup_trail, vec![Provider::Usda, Provider::UpcItemDb]);
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_merges_duplicates_across_providers() {
    let usda_hit = CanonicalFoodResult {
        fat_g: 0.4,
        ..greek_yogurt(Provider::Usda)
    };
    let off_hit = greek_yogurt(Provider::OpenFoodFacts);
    let resolver = resolver(
        ProviderSet::new()
            .with(FakeProvider::answering(usda_hit.clone()).with_hits(vec![usda_hit]))
            .with(FakeProvider::answering(off_hit.clone()).with_hits(vec![
                off_hit,
                food(Provider::OpenFoodFacts, "Oat Drink", "Oatly"),
            ])),
        ManualClock::new(),
    );

    let results = resolver
        .search_foods_with_fallback(
            "Acme Greek Yogurt",
            &candidates(&[Provider::Usda, Provider::OpenFoodFacts]),
            &SearchOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    let primary = &results[0];
    assert_eq!(primary.provider, Provider::Usda);
    assert_eq!(primary.confidence.score, 0.91);
    assert!(primary.confidence.is_verified);
    assert_eq!(primary.alternatives.len(), 1);
    assert_eq!(primary.alternatives[0].provider, Provider::OpenFoodFacts);
    assert!(primary.alternatives[0].confidence.score < primary.confidence.score);
    assert_eq!(
        primary.lookup_trail,
        vec![Provider::Usda, Provider::OpenFoodFacts]
    );

    let oat = &results[1];
    assert_eq!(oat.description, "Oat Drink");
    assert!(!oat.confidence.is_verified);
}

#[tokio::test]
async fn search_skips_failed_provider() {
    let off_hit = food(Provider::OpenFoodFacts, "Greek Yogurt", "Acme");
    let resolver = resolver(
        ProviderSet::new()
            .with(FakeProvider::failing(Provider::Usda, Behavior::ServerError))
            .with(FakeProvider::answering(off_hit)),
        ManualClock::new(),
    );

    let results = resolver
        .search_foods_with_fallback(
            "greek yogurt",
            &candidates(&[Provider::Usda, Provider::OpenFoodFacts]),
            &SearchOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].provider, Provider::OpenFoodFacts);
    assert_eq!(
        results[0].provider_failures,
        vec!["usda: API error (503): service unavailable".to_string()]
    );
}

#[tokio::test]
async fn search_with_no_results_anywhere_fails() {
    let resolver = resolver(
        ProviderSet::new()
            .with(FakeProvider::failing(Provider::Usda, Behavior::NotFound))
            .with(FakeProvider::answering(greek_yogurt(Provider::UpcItemDb)).with_hits(Vec::new())),
        ManualClock::new(),
    );
    let err = resolver
        .search_foods_with_fallback(
            "  Kale   Chips ",
            &candidates(&[Provider::Usda, Provider::UpcItemDb]),
            &SearchOptions::default(),
        )
        .await
        .unwrap_err();

    match err {
        ResolveError::NoResults { query, failures } => {
            assert_eq!(query, "kale chips");
            assert_eq!(failures.len(), 1);
        }
        other => panic!("expected NoResults, got {other:?}"),
    }
}

#[tokio::test]
async fn identity_guard_keeps_unrelated_hits_unverified() {
    let hit = CanonicalFoodResult {
        fat_g: 3.0,
        ..food(Provider::Usda, "Whole Milk", "Dairyland")
    };
    let resolver = resolver(
        ProviderSet::new().with(FakeProvider::answering(hit.clone()).with_hits(vec![hit])),
        ManualClock::new(),
    );
    let options = SearchOptions {
        threshold: Some(0.0),
        ..SearchOptions::default()
    };
    let results = resolver
        .search_foods(
            "chocolate cookies",
            &ProviderCandidate::new(Provider::Usda),
            &options,
        )
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert!(!results[0].confidence.is_verified);

    let verified = resolver
        .search_foods(
            "chocolate cookies",
            &ProviderCandidate::new(Provider::Usda),
            &SearchOptions {
                verified_only: true,
                ..options
            },
        )
        .await
        .unwrap();
    assert!(verified.is_empty());
}

#[tokio::test]
async fn search_results_are_cached_per_normalized_query_and_limit() {
    let fake = FakeProvider::answering(food(Provider::OpenFoodFacts, "Oat Drink", "Oatly"));
    let calls = fake.calls();
    let resolver = resolver(ProviderSet::new().with(fake), ManualClock::new());
    let candidate = ProviderCandidate::new(Provider::OpenFoodFacts);

    let first = resolver
        .search_foods("Oat Drink", &candidate, &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(first[0].source_tier, SourceTier::Provider);

    let second = resolver
        .search_foods("  oat   DRINK", &candidate, &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(second[0].source_tier, SourceTier::Cache);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    resolver
        .search_foods(
            "oat drink",
            &candidate,
            &SearchOptions {
                limit: Some(5),
                ..SearchOptions::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let listed = resolver.list_search_cache(None).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|s| s.key == "oat drink" && s.fresh));

    let removed = resolver
        .purge_search_cache(PurgeRequest {
            key: Some("OAT  Drink".into()),
            ..PurgeRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(removed, 2);
}

#[tokio::test]
async fn empty_search_is_not_cached() {
    let fake =
        FakeProvider::answering(greek_yogurt(Provider::UpcItemDb)).with_hits(Vec::new());
    let calls = fake.calls();
    let resolver = resolver(ProviderSet::new().with(fake), ManualClock::new());
    let candidate = ProviderCandidate::new(Provider::UpcItemDb);

    for _ in 0..2 {
        let results = resolver
            .search_foods("unobtainium", &candidate, &SearchOptions::default())
            .await
            .unwrap();
        assert!(results.is_empty());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(resolver.list_search_cache(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn search_input_is_validated() {
    let resolver = resolver(ProviderSet::new(), ManualClock::new());
    let candidate = ProviderCandidate::new(Provider::Usda);
    let cases = [
        ("   ", SearchOptions::default()),
        (
            "yogurt",
            SearchOptions {
                limit: Some(0),
                ..SearchOptions::default()
            },
        ),
        (
            "yogurt",
            SearchOptions {
                limit: Some(51),
                ..SearchOptions::default()
            },
        ),
        (
            "yogurt",
            SearchOptions {
                threshold: Some(-0.1),
                ..SearchOptions::default()
            },
        ),
    ];
    for (query, options) in cases {
        let err = resolver
            .search_foods(query, &candidate, &options)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::InputValidation(_)), "{query:?}");
    }
}
