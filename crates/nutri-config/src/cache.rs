//! Result cache lifetimes.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Longest accepted cache lifetime (about a century).
pub const MAX_TTL_DAYS: u32 = 36_500;

const fn default_barcode_ttl_days() -> u32 {
    30
}

const fn default_search_ttl_days() -> u32 {
    7
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Lifetime of a cached barcode lookup, in days.
    #[serde(default = "default_barcode_ttl_days")]
    pub barcode_ttl_days: u32,

    /// Lifetime of a cached search result list, in days.
    #[serde(default = "default_search_ttl_days")]
    pub search_ttl_days: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            barcode_ttl_days: default_barcode_ttl_days(),
            search_ttl_days: default_search_ttl_days(),
        }
    }
}

impl CacheConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        check_ttl("cache.barcode_ttl_days", self.barcode_ttl_days)?;
        check_ttl("cache.search_ttl_days", self.search_ttl_days)
    }
}

fn check_ttl(field: &str, days: u32) -> Result<(), ConfigError> {
    if days == 0 {
        return Err(ConfigError::invalid(field, "must be at least 1"));
    }
    if days > MAX_TTL_DAYS {
        return Err(ConfigError::invalid(
            field,
            format!("must be at most {MAX_TTL_DAYS}, got {days}"),
        ));
    }
    Ok(())
}
