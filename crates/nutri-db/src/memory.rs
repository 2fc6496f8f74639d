//! In-process [`FoodStore`] with the same semantics as the libSQL store.
//!
//! State lives in ordered maps behind a mutex; no lock is held across an
//! await point. Useful for embedding without a database file and for
//! orchestrator tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nutri_core::Provider;
use nutri_core::cache::{CacheEntry, CacheSummary, PurgeScope, SearchCacheEntry};
use nutri_core::overrides::OverrideRecord;

use crate::error::DatabaseError;
use crate::store::FoodStore;

type FoodKey = (Provider, String);
type SearchKey = (Provider, String, u32);

#[derive(Debug, Default)]
struct State {
    overrides: BTreeMap<FoodKey, OverrideRecord>,
    foods: BTreeMap<FoodKey, CacheEntry>,
    searches: BTreeMap<SearchKey, SearchCacheEntry>,
}

/// Memory-backed override store and caches.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, DatabaseError> {
        self.state
            .lock()
            .map_err(|_| DatabaseError::InvalidState("memory store lock poisoned".into()))
    }
}

fn in_scope(scope: &PurgeScope, provider: Provider, key: &str) -> bool {
    match scope {
        PurgeScope::All => true,
        PurgeScope::Provider(p) => *p == provider,
        PurgeScope::Key(k) => k == key,
        PurgeScope::ProviderKey(p, k) => *p == provider && k == key,
    }
}

fn wants(filter: Option<Provider>, provider: Provider) -> bool {
    filter.is_none_or(|p| p == provider)
}

#[async_trait]
impl FoodStore for MemoryStore {
    async fn get_override(
        &self,
        provider: Provider,
        barcode: &str,
    ) -> Result<Option<OverrideRecord>, DatabaseError> {
        Ok(self
            .lock()?
            .overrides
            .get(&(provider, barcode.to_string()))
            .cloned())
    }

    async fn upsert_override(
        &self,
        record: &OverrideRecord,
    ) -> Result<OverrideRecord, DatabaseError> {
        let mut state = self.lock()?;
        let key = (record.provider, record.barcode.clone());
        let mut stored = record.clone();
        if let Some(existing) = state.overrides.get(&key) {
            stored.created_at = existing.created_at;
        }
        state.overrides.insert(key, stored.clone());
        Ok(stored)
    }

    async fn delete_override(
        &self,
        provider: Provider,
        barcode: &str,
    ) -> Result<bool, DatabaseError> {
        Ok(self
            .lock()?
            .overrides
            .remove(&(provider, barcode.to_string()))
            .is_some())
    }

    async fn list_overrides(
        &self,
        provider: Option<Provider>,
    ) -> Result<Vec<OverrideRecord>, DatabaseError> {
        let mut records: Vec<OverrideRecord> = self
            .lock()?
            .overrides
            .values()
            .filter(|r| wants(provider, r.provider))
            .cloned()
            .collect();
        // same order as the SQL store: provider name, then barcode
        records.sort_by(|a, b| {
            (a.provider.as_str(), &a.barcode).cmp(&(b.provider.as_str(), &b.barcode))
        });
        Ok(records)
    }

    async fn get_cached_food(
        &self,
        provider: Provider,
        barcode: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, DatabaseError> {
        Ok(self
            .lock()?
            .foods
            .get(&(provider, barcode.to_string()))
            .filter(|entry| entry.is_fresh(now))
            .cloned())
    }

    async fn put_cached_food(&self, entry: &CacheEntry) -> Result<(), DatabaseError> {
        self.lock()?
            .foods
            .insert((entry.provider, entry.barcode.clone()), entry.clone());
        Ok(())
    }

    async fn list_cached_foods(
        &self,
        provider: Option<Provider>,
        now: DateTime<Utc>,
    ) -> Result<Vec<CacheSummary>, DatabaseError> {
        let mut summaries: Vec<CacheSummary> = self
            .lock()?
            .foods
            .values()
            .filter(|e| wants(provider, e.provider))
            .map(|e| CacheSummary {
                provider: e.provider,
                key: e.barcode.clone(),
                limit: None,
                label: e.food.description.clone(),
                fetched_at: e.fetched_at,
                expires_at: e.expires_at,
                fresh: e.is_fresh(now),
            })
            .collect();
        summaries.sort_by(|a, b| (a.provider.as_str(), &a.key).cmp(&(b.provider.as_str(), &b.key)));
        Ok(summaries)
    }

    async fn purge_cached_foods(&self, scope: &PurgeScope) -> Result<u64, DatabaseError> {
        let mut state = self.lock()?;
        let before = state.foods.len();
        state
            .foods
            .retain(|(provider, barcode), _| !in_scope(scope, *provider, barcode));
        Ok((before - state.foods.len()) as u64)
    }

    async fn get_cached_search(
        &self,
        provider: Provider,
        query: &str,
        limit: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<SearchCacheEntry>, DatabaseError> {
        Ok(self
            .lock()?
            .searches
            .get(&(provider, query.to_string(), limit))
            .filter(|entry| entry.is_fresh(now))
            .cloned())
    }

    async fn put_cached_search(&self, entry: &SearchCacheEntry) -> Result<(), DatabaseError> {
        self.lock()?.searches.insert(
            (entry.provider, entry.query.clone(), entry.limit),
            entry.clone(),
        );
        Ok(())
    }

    async fn list_cached_searches(
        &self,
        provider: Option<Provider>,
        now: DateTime<Utc>,
    ) -> Result<Vec<CacheSummary>, DatabaseError> {
        let mut summaries: Vec<CacheSummary> = self
            .lock()?
            .searches
            .values()
            .filter(|e| wants(provider, e.provider))
            .map(|e| CacheSummary {
                provider: e.provider,
                key: e.query.clone(),
                limit: Some(e.limit),
                label: format!("{} results", e.results.len()),
                fetched_at: e.fetched_at,
                expires_at: e.expires_at,
                fresh: e.is_fresh(now),
            })
            .collect();
        summaries.sort_by(|a, b| {
            (a.provider.as_str(), &a.key, a.limit).cmp(&(b.provider.as_str(), &b.key, b.limit))
        });
        Ok(summaries)
    }

    async fn purge_cached_searches(&self, scope: &PurgeScope) -> Result<u64, DatabaseError> {
        let mut state = self.lock()?;
        let before = state.searches.len();
        state
            .searches
            .retain(|(provider, query, _), _| !in_scope(scope, *provider, query));
        Ok((before - state.searches.len()) as u64)
    }
}
