//! External nutrition provider configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const fn default_timeout_secs() -> u64 {
    15
}

fn default_user_agent() -> String {
    "nutri/0.1 (food-identity resolver)".to_string()
}

fn default_usda_base_url() -> String {
    "https://api.nal.usda.gov/fdc/v1".to_string()
}

fn default_usda_api_key() -> String {
    "DEMO_KEY".to_string()
}

fn default_off_base_url() -> String {
    "https://world.openfoodfacts.org".to_string()
}

fn default_upc_base_url() -> String {
    "https://api.upcitemdb.com/prod/v1".to_string()
}

fn default_upc_trial_base_url() -> String {
    "https://api.upcitemdb.com/prod/trial".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    /// Budget for one outbound provider call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent sent to every provider (Open Food Facts asks for one).
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub usda: UsdaConfig,

    #[serde(default)]
    pub openfoodfacts: OpenFoodFactsConfig,

    #[serde(default)]
    pub upcitemdb: UpcItemDbConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            usda: UsdaConfig::default(),
            openfoodfacts: OpenFoodFactsConfig::default(),
            upcitemdb: UpcItemDbConfig::default(),
        }
    }
}

impl ProvidersConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid("providers.timeout_secs", "must be at least 1"));
        }
        for (field, url) in [
            ("providers.usda.base_url", &self.usda.base_url),
            ("providers.openfoodfacts.base_url", &self.openfoodfacts.base_url),
            ("providers.upcitemdb.base_url", &self.upcitemdb.base_url),
            ("providers.upcitemdb.trial_base_url", &self.upcitemdb.trial_base_url),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ConfigError::invalid(field, format!("not an http(s) URL: '{url}'")));
            }
        }
        Ok(())
    }
}

/// USDA FoodData Central. The key travels as the `api_key` query parameter.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UsdaConfig {
    #[serde(default = "default_usda_base_url")]
    pub base_url: String,

    /// Fallback key when the caller supplies none. `DEMO_KEY` is heavily rate-limited.
    #[serde(default = "default_usda_api_key")]
    pub api_key: String,
}

impl Default for UsdaConfig {
    fn default() -> Self {
        Self {
            base_url: default_usda_base_url(),
            api_key: default_usda_api_key(),
        }
    }
}

/// Open Food Facts. No key required.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenFoodFactsConfig {
    #[serde(default = "default_off_base_url")]
    pub base_url: String,
}

impl Default for OpenFoodFactsConfig {
    fn default() -> Self {
        Self {
            base_url: default_off_base_url(),
        }
    }
}

/// UPCitemdb. A key switches from the trial endpoint to the paid one and
/// travels in the `user_key` header.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpcItemDbConfig {
    #[serde(default = "default_upc_base_url")]
    pub base_url: String,

    #[serde(default = "default_upc_trial_base_url")]
    pub trial_base_url: String,

    #[serde(default)]
    pub api_key: String,
}

impl Default for UpcItemDbConfig {
    fn default() -> Self {
        Self {
            base_url: default_upc_base_url(),
            trial_base_url: default_upc_trial_base_url(),
            api_key: String::new(),
        }
    }
}

impl UpcItemDbConfig {
    #[must_use]
    pub fn has_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}
