//! Cache entry types and purge scopes for the barcode and search caches.

use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::Provider;
use crate::errors::CoreError;
use crate::food::CanonicalFoodResult;

/// Default lifetime of a barcode cache entry.
pub const DEFAULT_BARCODE_TTL_DAYS: i64 = 30;
/// Default lifetime of a search cache entry.
pub const DEFAULT_SEARCH_TTL_DAYS: i64 = 7;

/// Last successful barcode fetch for (provider, barcode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CacheEntry {
    pub provider: Provider,
    pub barcode: String,
    pub food: CanonicalFoodResult,
    /// Raw provider response body, kept for audit.
    pub raw_payload: String,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// `fetched_at + ttl`, or a validation error when the sum leaves chrono's range.
fn expiry(fetched_at: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, CoreError> {
    fetched_at.checked_add_signed(ttl).ok_or_else(|| {
        CoreError::validation(format!(
            "cache TTL of {} days is out of range",
            ttl.num_days()
        ))
    })
}

impl CacheEntry {
    /// Snapshot `food` with an expiry `ttl` after `fetched_at`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] when the expiry overflows the
    /// representable timestamp range.
    pub fn new(
        food: CanonicalFoodResult,
        barcode: &str,
        raw_payload: String,
        fetched_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, CoreError> {
        let expires_at = expiry(fetched_at, ttl)?;
        Ok(Self {
            provider: food.provider,
            barcode: barcode.to_string(),
            food: food.into_snapshot(),
            raw_payload,
            fetched_at,
            expires_at,
        })
    }

    /// Fresh entries are served; expired ones read as a miss.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Last successful search for (provider, normalized query, requested limit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchCacheEntry {
    pub provider: Provider,
    /// Normalized query (see [`crate::identity::normalize_query`]).
    pub query: String,
    pub limit: u32,
    pub results: Vec<CanonicalFoodResult>,
    pub raw_payload: String,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SearchCacheEntry {
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] when the expiry overflows the
    /// representable timestamp range.
    pub fn new(
        provider: Provider,
        query: &str,
        limit: u32,
        results: Vec<CanonicalFoodResult>,
        raw_payload: String,
        fetched_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, CoreError> {
        let expires_at = expiry(fetched_at, ttl)?;
        Ok(Self {
            provider,
            query: query.to_string(),
            limit,
            results: results
                .into_iter()
                .map(CanonicalFoodResult::into_snapshot)
                .collect(),
            raw_payload,
            fetched_at,
            expires_at,
        })
    }

    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// One row of a cache listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CacheSummary {
    pub provider: Provider,
    /// Barcode for the barcode cache, normalized query for the search cache.
    pub key: String,
    /// Requested limit (search cache only).
    pub limit: Option<u32>,
    /// Description of the cached item, or `"<n> results"` for searches.
    pub label: String,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub fresh: bool,
}

/// Caller-facing purge request; must name at least one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeRequest {
    #[serde(default)]
    pub all: bool,
    #[serde(default)]
    pub provider: Option<Provider>,
    /// Barcode (barcode cache) or query (search cache, normalized on purge).
    #[serde(default)]
    pub key: Option<String>,
}

/// Validated purge scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeScope {
    All,
    Provider(Provider),
    Key(String),
    ProviderKey(Provider, String),
}

impl PurgeRequest {
    #[must_use]
    pub fn all() -> Self {
        Self {
            all: true,
            ..Self::default()
        }
    }

    /// Resolve into a [`PurgeScope`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] when no scope is named, when `all` is
    /// combined with a narrower scope, or when the key is blank.
    pub fn into_scope(self) -> Result<PurgeScope, CoreError> {
        let key = match self.key {
            Some(k) if k.trim().is_empty() => {
                return Err(CoreError::validation("purge key must not be blank"));
            }
            Some(k) => Some(k.trim().to_string()),
            None => None,
        };
        match (self.all, self.provider, key) {
            (true, None, None) => Ok(PurgeScope::All),
            (true, _, _) => Err(CoreError::validation(
                "purge 'all' cannot be combined with a provider or key",
            )),
            (false, Some(p), None) => Ok(PurgeScope::Provider(p)),
            (false, None, Some(k)) => Ok(PurgeScope::Key(k)),
            (false, Some(p), Some(k)) => Ok(PurgeScope::ProviderKey(p, k)),
            (false, None, None) => Err(CoreError::validation(
                "purge requires a scope: all, provider, key, or provider and key",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn entry_expires_after_ttl() {
        let now = Utc::now();
        let entry = CacheEntry::new(
            CanonicalFoodResult::new(Provider::OpenFoodFacts),
            "3017620422003",
            "{}".into(),
            now,
            Duration::days(DEFAULT_BARCODE_TTL_DAYS),
        )
        .unwrap();
        assert!(entry.is_fresh(now + Duration::days(29)));
        assert!(!entry.is_fresh(now + Duration::days(30)));
    }

    #[test]
    fn search_entry_snapshots_results() {
        let now = Utc::now();
        let mut food = CanonicalFoodResult::new(Provider::Usda);
        food.lookup_trail.push(Provider::Usda);
        let entry = SearchCacheEntry::new(
            Provider::Usda,
            "oat milk",
            10,
            vec![food],
            "{}".into(),
            now,
            Duration::days(DEFAULT_SEARCH_TTL_DAYS),
        )
        .unwrap();
        assert!(entry.results[0].lookup_trail.is_empty());
        assert_eq!(entry.expires_at - entry.fetched_at, Duration::days(7));
    }

    #[test]
    fn ttl_past_the_timestamp_range_is_an_error() {
        let now = Utc::now();
        let ttl = Duration::days(100_000_000);
        let err = CacheEntry::new(
            CanonicalFoodResult::new(Provider::Usda),
            "012345678905",
            "{}".into(),
            now,
            ttl,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(ref msg) if msg.contains("100000000 days")));

        let err =
            SearchCacheEntry::new(Provider::Usda, "oat milk", 10, vec![], "{}".into(), now, ttl)
                .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn purge_scopes_resolve() {
        assert_eq!(PurgeRequest::all().into_scope().unwrap(), PurgeScope::All);
        assert_eq!(
            PurgeRequest {
                provider: Some(Provider::Usda),
                ..PurgeRequest::default()
            }
            .into_scope()
            .unwrap(),
            PurgeScope::Provider(Provider::Usda)
        );
        assert_eq!(
            PurgeRequest {
                key: Some(" 012345678905 ".into()),
                ..PurgeRequest::default()
            }
            .into_scope()
            .unwrap(),
            PurgeScope::Key("012345678905".into())
        );
        assert_eq!(
            PurgeRequest {
                provider: Some(Provider::UpcItemDb),
                key: Some("012345678905".into()),
                all: false,
            }
            .into_scope()
            .unwrap(),
            PurgeScope::ProviderKey(Provider::UpcItemDb, "012345678905".into())
        );
    }

    #[test]
    fn purge_without_scope_is_rejected() {
        let err = PurgeRequest::default().into_scope().unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn purge_all_with_provider_is_rejected() {
        let req = PurgeRequest {
            all: true,
            provider: Some(Provider::Usda),
            key: None,
        };
        assert!(req.into_scope().is_err());
    }

    #[test]
    fn purge_blank_key_is_rejected() {
        let req = PurgeRequest {
            key: Some("  ".into()),
            ..PurgeRequest::default()
        };
        assert!(req.into_scope().is_err());
    }
}
