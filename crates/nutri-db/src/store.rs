//! The storage seam the orchestrators depend on.
//!
//! [`FoodStore`] covers the three tables: overrides, the barcode cache, and
//! the search cache. Cache reads take the caller's `now` so freshness is a
//! pure read-time comparison against `expires_at`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nutri_core::Provider;
use nutri_core::cache::{CacheEntry, CacheSummary, PurgeScope, SearchCacheEntry};
use nutri_core::overrides::OverrideRecord;

use crate::NutriDb;
use crate::error::DatabaseError;

/// Override store plus barcode and search result caches.
#[async_trait]
pub trait FoodStore: Send + Sync {
    async fn get_override(
        &self,
        provider: Provider,
        barcode: &str,
    ) -> Result<Option<OverrideRecord>, DatabaseError>;

    /// Upsert keyed by (provider, barcode); an existing `created_at` is kept.
    async fn upsert_override(
        &self,
        record: &OverrideRecord,
    ) -> Result<OverrideRecord, DatabaseError>;

    /// Returns whether a record was removed.
    async fn delete_override(
        &self,
        provider: Provider,
        barcode: &str,
    ) -> Result<bool, DatabaseError>;

    async fn list_overrides(
        &self,
        provider: Option<Provider>,
    ) -> Result<Vec<OverrideRecord>, DatabaseError>;

    async fn get_cached_food(
        &self,
        provider: Provider,
        barcode: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, DatabaseError>;

    async fn put_cached_food(&self, entry: &CacheEntry) -> Result<(), DatabaseError>;

    async fn list_cached_foods(
        &self,
        provider: Option<Provider>,
        now: DateTime<Utc>,
    ) -> Result<Vec<CacheSummary>, DatabaseError>;

    async fn purge_cached_foods(&self, scope: &PurgeScope) -> Result<u64, DatabaseError>;

    async fn get_cached_search(
        &self,
        provider: Provider,
        query: &str,
        limit: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<SearchCacheEntry>, DatabaseError>;

    async fn put_cached_search(&self, entry: &SearchCacheEntry) -> Result<(), DatabaseError>;

    async fn list_cached_searches(
        &self,
        provider: Option<Provider>,
        now: DateTime<Utc>,
    ) -> Result<Vec<CacheSummary>, DatabaseError>;

    async fn purge_cached_searches(&self, scope: &PurgeScope) -> Result<u64, DatabaseError>;
}

#[async_trait]
impl FoodStore for NutriDb {
    async fn get_override(
        &self,
        provider: Provider,
        barcode: &str,
    ) -> Result<Option<OverrideRecord>, DatabaseError> {
        Self::get_override(self, provider, barcode).await
    }

    async fn upsert_override(
        &self,
        record: &OverrideRecord,
    ) -> Result<OverrideRecord, DatabaseError> {
        Self::upsert_override(self, record).await
    }

    async fn delete_override(
        &self,
        provider: Provider,
        barcode: &str,
    ) -> Result<bool, DatabaseError> {
        Self::delete_override(self, provider, barcode).await
    }

    async fn list_overrides(
        &self,
        provider: Option<Provider>,
    ) -> Result<Vec<OverrideRecord>, DatabaseError> {
        Self::list_overrides(self, provider).await
    }

    async fn get_cached_food(
        &self,
        provider: Provider,
        barcode: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, DatabaseError> {
        Self::get_cached_food(self, provider, barcode, now).await
    }

    async fn put_cached_food(&self, entry: &CacheEntry) -> Result<(), DatabaseError> {
        Self::put_cached_food(self, entry).await
    }

    async fn list_cached_foods(
        &self,
        provider: Option<Provider>,
        now: DateTime<Utc>,
    ) -> Result<Vec<CacheSummary>, DatabaseError> {
        Self::list_cached_foods(self, provider, now).await
    }

    async fn purge_cached_foods(&self, scope: &PurgeScope) -> Result<u64, DatabaseError> {
        Self::purge_cached_foods(self, scope).await
    }

    async fn get_cached_search(
        &self,
        provider: Provider,
        query: &str,
        limit: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<SearchCacheEntry>, DatabaseError> {
        Self::get_cached_search(self, provider, query, limit, now).await
    }

    async fn put_cached_search(&self, entry: &SearchCacheEntry) -> Result<(), DatabaseError> {
        Self::put_cached_search(self, entry).await
    }

    async fn list_cached_searches(
        &self,
        provider: Option<Provider>,
        now: DateTime<Utc>,
    ) -> Result<Vec<CacheSummary>, DatabaseError> {
        Self::list_cached_searches(self, provider, now).await
    }

    async fn purge_cached_searches(&self, scope: &PurgeScope) -> Result<u64, DatabaseError> {
        Self::purge_cached_searches(self, scope).await
    }
}
