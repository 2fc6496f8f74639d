//! # nutri-resolve
//!
//! Tiered food-identity resolution for nutri.
//!
//! A barcode resolves through three tiers, short-circuiting on the first hit:
//!
//! ```text
//! override store → barcode cache (TTL) → provider adapter (15 s bound)
//! ```
//!
//! Search skips the override tier. [`FoodResolver`] also runs the fallback
//! orchestrators over ordered provider candidates, scores every result
//! ([`scoring`]), and folds search hits describing the same item into one
//! ranked primary with alternatives ([`rank`]).
//!
//! Resolution is sequential: one awaited provider call at a time, no spawned
//! tasks.

pub mod cache_admin;
pub mod clock;
pub mod error;
pub mod fallback;
pub mod overrides;
pub mod rank;
pub mod resolution;
pub mod scoring;

pub use clock::{Clock, SystemClock};
pub use error::ResolveError;

use std::sync::Arc;
use std::time::Duration;

use nutri_config::NutriConfig;
use nutri_core::Provider;
use nutri_db::{FoodStore, NutriDb};
use nutri_providers::{Credentials, ProviderSet};

// ── Options ────────────────────────────────────────────────────────

/// Per-call options for a single-provider barcode lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupOptions {
    pub credentials: Credentials,
    /// Verification threshold; the configured default when `None`.
    pub threshold: Option<f64>,
}

/// One entry of an ordered fallback list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCandidate {
    pub provider: Provider,
    pub credentials: Credentials,
}

impl ProviderCandidate {
    /// Candidate using the adapter's configured key.
    #[must_use]
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            credentials: Credentials::default(),
        }
    }

    #[must_use]
    pub fn with_key(provider: Provider, key: impl Into<String>) -> Self {
        Self {
            provider,
            credentials: Credentials::with_key(key),
        }
    }
}

/// Per-call search options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    /// Maximum results; the configured default when `None`.
    pub limit: Option<u32>,
    pub threshold: Option<f64>,
    /// Drop unverified primaries from the ranked output.
    pub verified_only: bool,
}

// ── Settings ───────────────────────────────────────────────────────

/// Resolver tunables, normally taken from [`NutriConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverSettings {
    pub barcode_ttl: chrono::Duration,
    pub search_ttl: chrono::Duration,
    pub verified_threshold: f64,
    /// Upper bound on one provider call.
    pub provider_timeout: Duration,
    pub default_search_limit: u32,
    pub max_search_limit: u32,
}

impl ResolverSettings {
    #[must_use]
    pub fn from_config(config: &NutriConfig) -> Self {
        Self {
            barcode_ttl: chrono::Duration::days(i64::from(config.cache.barcode_ttl_days)),
            search_ttl: chrono::Duration::days(i64::from(config.cache.search_ttl_days)),
            verified_threshold: config.scoring.verified_threshold,
            provider_timeout: Duration::from_secs(config.providers.timeout_secs),
            default_search_limit: config.general.default_search_limit,
            max_search_limit: config.general.max_search_limit,
        }
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self::from_config(&NutriConfig::default())
    }
}

// ── Resolver ───────────────────────────────────────────────────────

/// Entry point for barcode lookups, searches, overrides, and cache admin.
///
/// Operations are spread over the [`resolution`], [`fallback`],
/// [`overrides`], and [`cache_admin`] modules.
pub struct FoodResolver {
    store: Arc<dyn FoodStore>,
    providers: ProviderSet,
    clock: Arc<dyn Clock>,
    settings: ResolverSettings,
}

impl FoodResolver {
    /// Resolver over `store` and `providers` with default settings.
    #[must_use]
    pub fn new(store: Arc<dyn FoodStore>, providers: ProviderSet) -> Self {
        Self {
            store,
            providers,
            clock: Arc::new(SystemClock),
            settings: ResolverSettings::default(),
        }
    }

    /// Open the configured database and build the HTTP adapters.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Setup`] if the HTTP client cannot be built and
    /// [`ResolveError::Store`] if the database cannot be opened.
    pub async fn from_config(config: &NutriConfig) -> Result<Self, ResolveError> {
        let providers = ProviderSet::from_config(&config.providers)
            .map_err(|e| ResolveError::Setup(format!("provider adapters: {e}")))?;
        let db = NutriDb::open_local(&config.general.database_path).await?;
        tracing::debug!(
            path = %config.general.database_path,
            providers = ?providers.providers(),
            "resolver ready"
        );
        Ok(Self::new(Arc::new(db), providers).with_settings(ResolverSettings::from_config(config)))
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ResolverSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the wall clock (TTL tests).
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub const fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    #[must_use]
    pub const fn providers(&self) -> &ProviderSet {
        &self.providers
    }

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    fn threshold(&self, requested: Option<f64>) -> Result<f64, ResolveError> {
        let threshold = requested.unwrap_or(self.settings.verified_threshold);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ResolveError::InputValidation(format!(
                "threshold must be within [0, 1], got {threshold}"
            )));
        }
        Ok(threshold)
    }
}

impl std::fmt::Debug for FoodResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FoodResolver")
            .field("providers", &self.providers)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutri_db::MemoryStore;

    #[test]
    fn settings_follow_config() {
        let mut config = NutriConfig::default();
        config.cache.barcode_ttl_days = 2;
        config.providers.timeout_secs = 3;
        let settings = ResolverSettings::from_config(&config);
        assert_eq!(settings.barcode_ttl, chrono::Duration::days(2));
        assert_eq!(settings.search_ttl, chrono::Duration::days(7));
        assert_eq!(settings.provider_timeout, Duration::from_secs(3));
        assert_eq!(settings.max_search_limit, 50);
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        let resolver = FoodResolver::new(Arc::new(MemoryStore::new()), ProviderSet::new());
        assert!((resolver.threshold(None).unwrap() - 0.80).abs() < f64::EPSILON);
        assert!(resolver.threshold(Some(1.2)).is_err());
        assert!(resolver.threshold(Some(f64::NAN)).is_err());
    }

    #[tokio::test]
    async fn from_config_opens_database_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = NutriConfig::default();
        config.general.database_path = dir
            .path()
            .join("data")
            .join("nutri.db")
            .to_string_lossy()
            .into_owned();
        let resolver = FoodResolver::from_config(&config).await.unwrap();
        assert_eq!(resolver.providers().providers(), Provider::ALL.to_vec());
        assert!(dir.path().join("data").join("nutri.db").exists());
    }
}
