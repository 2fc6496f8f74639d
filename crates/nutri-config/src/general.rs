//! General application configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const fn default_search_limit() -> u32 {
    10
}

const fn max_search_limit() -> u32 {
    50
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("nutri").join("nutri.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "nutri.db".to_string())
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Path of the libSQL database holding overrides and both caches.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Result limit used when a search does not specify one.
    #[serde(default = "default_search_limit")]
    pub default_search_limit: u32,

    /// Upper bound accepted for a search limit.
    #[serde(default = "max_search_limit")]
    pub max_search_limit: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            default_search_limit: default_search_limit(),
            max_search_limit: max_search_limit(),
        }
    }
}

impl GeneralConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.max_search_limit == 0 {
            return Err(ConfigError::invalid("general.max_search_limit", "must be at least 1"));
        }
        if self.default_search_limit == 0 || self.default_search_limit > self.max_search_limit {
            return Err(ConfigError::invalid(
                "general.default_search_limit",
                format!("must be within 1..={}", self.max_search_limit),
            ));
        }
        Ok(())
    }
}
