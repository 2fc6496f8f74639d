//! Single-provider resolution.
//!
//! Barcode: override → cache → provider, stopping at the first hit. Search:
//! cache → provider. Provider failures propagate unchanged; the fallback
//! orchestrator decides whether to move on.

use std::future::Future;

use nutri_core::cache::{CacheEntry, SearchCacheEntry};
use nutri_core::identity::{validate_barcode, validate_query};
use nutri_core::{CanonicalFoodResult, ConfidenceScore, Provider, SourceTier};
use nutri_providers::{Credentials, Fetched, ProviderError};

use crate::error::ResolveError;
use crate::rank::{dedup_and_rank, finalize};
use crate::scoring::{score_barcode, score_search};
use crate::{FoodResolver, LookupOptions, ProviderCandidate, SearchOptions};

impl FoodResolver {
    /// Resolve `barcode` against one provider.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InputValidation`] for a malformed barcode or
    /// threshold, [`ResolveError::Store`] when the store fails,
    /// [`ResolveError::Provider`] when the adapter call fails, and
    /// [`ResolveError::Setup`] when the barcode TTL cannot date a cache entry.
    pub async fn lookup_barcode(
        &self,
        provider: Provider,
        barcode: &str,
        options: &LookupOptions,
    ) -> Result<CanonicalFoodResult, ResolveError> {
        let barcode = validate_barcode(barcode)?;
        let threshold = self.threshold(options.threshold)?;

        if let Some(record) = self.store.get_override(provider, barcode).await? {
            tracing::debug!(%provider, barcode, "override hit");
            let mut food = record.food;
            food.provider = provider;
            food.identifier = barcode.to_string();
            food.source_tier = SourceTier::Override;
            food.exact_match = true;
            food.confidence = ConfidenceScore::override_exempt();
            food.lookup_trail = vec![provider];
            return Ok(food);
        }

        let now = self.now();
        if let Some(entry) = self.store.get_cached_food(provider, barcode, now).await? {
            tracing::debug!(%provider, barcode, expires_at = %entry.expires_at, "cache hit");
            let mut food = entry.food;
            food.source_tier = SourceTier::Cache;
            if !provider.is_government() {
                food.exact_match = true;
            }
            food.refresh_completeness();
            food.confidence = score_barcode(&food, threshold);
            food.lookup_trail = vec![provider];
            return Ok(food);
        }

        self.fetch_and_cache(provider, barcode, &options.credentials, threshold)
            .await
    }

    /// Bypass the override and cache tiers, fetch, and overwrite the cache.
    ///
    /// # Errors
    ///
    /// Same as [`Self::lookup_barcode`].
    pub async fn refresh_cache(
        &self,
        provider: Provider,
        barcode: &str,
        options: &LookupOptions,
    ) -> Result<CanonicalFoodResult, ResolveError> {
        let barcode = validate_barcode(barcode)?;
        let threshold = self.threshold(options.threshold)?;
        tracing::debug!(%provider, barcode, "refreshing cache entry");
        self.fetch_and_cache(provider, barcode, &options.credentials, threshold)
            .await
    }

    async fn fetch_and_cache(
        &self,
        provider: Provider,
        barcode: &str,
        credentials: &Credentials,
        threshold: f64,
    ) -> Result<CanonicalFoodResult, ResolveError> {
        let adapter = self
            .providers
            .get(provider)
            .map_err(|e| ResolveError::provider(provider, e))?;
        let Fetched { value, raw } = self
            .bounded(provider, adapter.lookup(barcode, credentials))
            .await?;

        let mut food = value;
        food.provider = provider;
        food.source_tier = SourceTier::Provider;
        food.refresh_completeness();

        let now = self.now();
        let entry = CacheEntry::new(food.clone(), barcode, raw, now, self.settings.barcode_ttl)
            .map_err(|e| ResolveError::Setup(e.to_string()))?;
        self.store.put_cached_food(&entry).await?;
        tracing::info!(%provider, barcode, expires_at = %entry.expires_at, "cached barcode result");

        food.confidence = score_barcode(&food, threshold);
        food.lookup_trail = vec![provider];
        Ok(food)
    }

    /// Search one provider.
    ///
    /// An empty result list is not an error here; the fallback search decides
    /// what an overall empty answer means.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InputValidation`] for an empty query or an
    /// out-of-range limit or threshold, [`ResolveError::Store`] when the store
    /// fails, and [`ResolveError::Provider`] when the adapter call fails.
    pub async fn search_foods(
        &self,
        query: &str,
        candidate: &ProviderCandidate,
        options: &SearchOptions,
    ) -> Result<Vec<CanonicalFoodResult>, ResolveError> {
        let (normalized, limit, threshold) = self.validate_search(query, options)?;
        let hits = self
            .search_one(&normalized, candidate, limit, threshold)
            .await?;
        let ranked = dedup_and_rank(hits, &[candidate.provider]);
        Ok(finalize(ranked, options.verified_only, limit as usize))
    }

    pub(crate) fn validate_search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<(String, u32, f64), ResolveError> {
        let normalized = validate_query(query)?;
        let limit = options.limit.unwrap_or(self.settings.default_search_limit);
        if limit == 0 || limit > self.settings.max_search_limit {
            return Err(ResolveError::InputValidation(format!(
                "limit must be within 1..={}, got {limit}",
                self.settings.max_search_limit
            )));
        }
        let threshold = self.threshold(options.threshold)?;
        Ok((normalized, limit, threshold))
    }

    /// Cache-then-fetch for one provider, scored but not ranked.
    pub(crate) async fn search_one(
        &self,
        query: &str,
        candidate: &ProviderCandidate,
        limit: u32,
        threshold: f64,
    ) -> Result<Vec<CanonicalFoodResult>, ResolveError> {
        let provider = candidate.provider;
        let now = self.now();

        let (results, tier) = if let Some(entry) = self
            .store
            .get_cached_search(provider, query, limit, now)
            .await?
        {
            tracing::debug!(%provider, query, limit, "search cache hit");
            (entry.results, SourceTier::Cache)
        } else {
            let adapter = self
                .providers
                .get(provider)
                .map_err(|e| ResolveError::provider(provider, e))?;
            let Fetched { value, raw } = self
                .bounded(
                    provider,
                    adapter.search(query, limit, &candidate.credentials),
                )
                .await?;
            if !value.is_empty() {
                let entry = SearchCacheEntry::new(
                    provider,
                    query,
                    limit,
                    value.clone(),
                    raw,
                    now,
                    self.settings.search_ttl,
                )
                .map_err(|e| ResolveError::Setup(e.to_string()))?;
                self.store.put_cached_search(&entry).await?;
                tracing::info!(%provider, query, results = value.len(), "cached search results");
            }
            (value, SourceTier::Provider)
        };

        Ok(results
            .into_iter()
            .map(|mut food| {
                food.provider = provider;
                food.source_tier = tier;
                food.refresh_completeness();
                food.confidence = score_search(&food, query, threshold);
                food.lookup_trail = vec![provider];
                food
            })
            .collect())
    }

    /// Run one adapter call under the provider time budget.
    async fn bounded<T>(
        &self,
        provider: Provider,
        call: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, ResolveError> {
        let budget = self.settings.provider_timeout;
        match tokio::time::timeout(budget, call).await {
            Ok(result) => result.map_err(|e| ResolveError::provider(provider, e)),
            Err(_) => Err(ResolveError::provider(
                provider,
                ProviderError::Timeout {
                    secs: budget.as_secs() + u64::from(budget.subsec_nanos() > 0),
                },
            )),
        }
    }
}
