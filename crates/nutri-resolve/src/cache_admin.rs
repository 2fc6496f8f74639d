//! Cache listing and purging.

use nutri_core::Provider;
use nutri_core::cache::{CacheSummary, PurgeRequest, PurgeScope};
use nutri_core::identity::{normalize_query, validate_barcode};

use crate::FoodResolver;
use crate::error::ResolveError;

impl FoodResolver {
    /// Barcode cache entries, expired ones included and flagged.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Store`] when the read fails.
    pub async fn list_cache(
        &self,
        provider: Option<Provider>,
    ) -> Result<Vec<CacheSummary>, ResolveError> {
        Ok(self.store.list_cached_foods(provider, self.now()).await?)
    }

    /// Remove barcode cache entries in scope; returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InputValidation`] when the request names no
    /// scope, combines `all` with a narrower scope, or carries a malformed
    /// barcode, and [`ResolveError::Store`] when the delete fails.
    pub async fn purge_cache(&self, request: PurgeRequest) -> Result<u64, ResolveError> {
        let scope = match request.into_scope()? {
            PurgeScope::Key(key) => PurgeScope::Key(validate_barcode(&key)?.to_string()),
            PurgeScope::ProviderKey(p, key) => {
                PurgeScope::ProviderKey(p, validate_barcode(&key)?.to_string())
            }
            other => other,
        };
        let removed = self.store.purge_cached_foods(&scope).await?;
        tracing::info!(?scope, removed, "purged barcode cache");
        Ok(removed)
    }

    /// Search cache entries, expired ones included and flagged.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Store`] when the read fails.
    pub async fn list_search_cache(
        &self,
        provider: Option<Provider>,
    ) -> Result<Vec<CacheSummary>, ResolveError> {
        Ok(self.store.list_cached_searches(provider, self.now()).await?)
    }

    /// Remove search cache entries in scope; a query key covers every limit.
    ///
    /// # Errors
    ///
    /// Same as [`Self::purge_cache`], minus the barcode check.
    pub async fn purge_search_cache(&self, request: PurgeRequest) -> Result<u64, ResolveError> {
        let scope = match request.into_scope()? {
            PurgeScope::Key(key) => PurgeScope::Key(normalize_query(&key)),
            PurgeScope::ProviderKey(p, key) => PurgeScope::ProviderKey(p, normalize_query(&key)),
            other => other,
        };
        let removed = self.store.purge_cached_searches(&scope).await?;
        tracing::info!(?scope, removed, "purged search cache");
        Ok(removed)
    }
}
