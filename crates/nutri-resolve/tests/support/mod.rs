//! Shared fixtures for resolver integration tests: a scripted adapter that
//! counts its calls, a settable clock, and food builders.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use nutri_core::{CanonicalFoodResult, Provider};
use nutri_db::MemoryStore;
use nutri_providers::{Credentials, Fetched, FoodProvider, ProviderError, ProviderSet};
use nutri_resolve::{Clock, FoodResolver, ResolverSettings};

pub const YOGURT_BARCODE: &str = "012345678905";

/// What a [`FakeProvider`] does when called.
#[derive(Debug, Clone)]
pub enum Behavior {
    Answer,
    NotFound,
    ServerError,
    Hang(Duration),
}

/// Scripted adapter. Counts every call, successful or not.
pub struct FakeProvider {
    provider: Provider,
    behavior: Behavior,
    food: CanonicalFoodResult,
    hits: Vec<CanonicalFoodResult>,
    calls: Arc<AtomicUsize>,
    last_key: Arc<Mutex<Option<String>>>,
}

impl FakeProvider {
    pub fn answering(food: CanonicalFoodResult) -> Self {
        Self {
            provider: food.provider,
            behavior: Behavior::Answer,
            hits: vec![food.clone()],
            food,
            calls: Arc::new(AtomicUsize::new(0)),
            last_key: Arc::new(Mutex::new(None)),
        }
    }

    pub fn failing(provider: Provider, behavior: Behavior) -> Self {
        Self {
            behavior,
            ..Self::answering(CanonicalFoodResult::new(provider))
        }
    }

    pub fn with_hits(mut self, hits: Vec<CanonicalFoodResult>) -> Self {
        self.hits = hits;
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn last_key(&self) -> Arc<Mutex<Option<String>>> {
        Arc::clone(&self.last_key)
    }

    async fn act(&self, credentials: &Credentials) -> Result<(), ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_key.lock().unwrap() = credentials.api_key.clone();
        match &self.behavior {
            Behavior::Answer => Ok(()),
            Behavior::NotFound => Err(ProviderError::NotFound(format!(
                "{} has no item",
                self.provider
            ))),
            Behavior::ServerError => Err(ProviderError::Api {
                status: 503,
                message: "service unavailable".into(),
            }),
            Behavior::Hang(d) => {
                tokio::time::sleep(*d).await;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl FoodProvider for FakeProvider {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn lookup(
        &self,
        barcode: &str,
        credentials: &Credentials,
    ) -> Result<Fetched<CanonicalFoodResult>, ProviderError> {
        self.act(credentials).await?;
        let mut value = self.food.clone();
        value.identifier = barcode.to_string();
        Ok(Fetched {
            value,
            raw: format!("{{\"barcode\":\"{barcode}\"}}"),
        })
    }

    async fn search(
        &self,
        _query: &str,
        limit: u32,
        credentials: &Credentials,
    ) -> Result<Fetched<Vec<CanonicalFoodResult>>, ProviderError> {
        self.act(credentials).await?;
        Ok(Fetched {
            value: self.hits.iter().take(limit as usize).cloned().collect(),
            raw: "[]".into(),
        })
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()),
        })
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Resolver over a fresh memory store.
pub fn resolver(providers: ProviderSet, clock: Arc<ManualClock>) -> FoodResolver {
    FoodResolver::new(Arc::new(MemoryStore::new()), providers).with_clock(clock)
}

/// Settings with a short provider timeout.
pub fn quick_settings() -> ResolverSettings {
    ResolverSettings {
        provider_timeout: Duration::from_millis(50),
        ..ResolverSettings::default()
    }
}

/// Greek Yogurt, 170 g: 100 kcal, 17 g protein, 6 g carbs, 0 g fat.
pub fn greek_yogurt(provider: Provider) -> CanonicalFoodResult {
    CanonicalFoodResult {
        identifier: YOGURT_BARCODE.into(),
        description: "Greek Yogurt".into(),
        brand: "Acme".into(),
        serving_amount: 170.0,
        serving_unit: "g".into(),
        calories: 100.0,
        protein_g: 17.0,
        carbs_g: 6.0,
        fat_g: 0.0,
        exact_match: true,
        ..CanonicalFoodResult::new(provider)
    }
}

pub fn food(provider: Provider, description: &str, brand: &str) -> CanonicalFoodResult {
    CanonicalFoodResult {
        description: description.into(),
        brand: brand.into(),
        serving_amount: 100.0,
        serving_unit: "g".into(),
        calories: 120.0,
        protein_g: 4.0,
        carbs_g: 20.0,
        fat_g: 2.5,
        ..CanonicalFoodResult::new(provider)
    }
}
