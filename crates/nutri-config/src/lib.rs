//! # nutri-config
//!
//! Layered configuration loading for nutri using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`NUTRI_*` prefix, `__` as separator)
//! 2. Project-level `.nutri/config.toml`
//! 3. User-level `~/.config/nutri/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `NUTRI_CACHE__BARCODE_TTL_DAYS` -> `cache.barcode_ttl_days`,
//! `NUTRI_PROVIDERS__USDA__API_KEY` -> `providers.usda.api_key`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use nutri_config::NutriConfig;
//!
//! let config = NutriConfig::load_with_dotenv().expect("config");
//! println!("barcode TTL: {} days", config.cache.barcode_ttl_days);
//! ```

mod cache;
mod error;
mod general;
mod providers;
mod scoring;

pub use cache::{CacheConfig, MAX_TTL_DAYS};
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use providers::{OpenFoodFactsConfig, ProvidersConfig, UpcItemDbConfig, UsdaConfig};
pub use scoring::ScoringConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NutriConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl NutriConfig {
    /// Load configuration from all sources (TOML files + environment variables)
    /// and validate it.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if extraction fails or a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if extraction fails or a value is out of range.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment or add providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".nutri/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("NUTRI_").split("__"))
    }

    /// Check cross-field constraints that serde defaults cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.validate()?;
        self.scoring.validate()?;
        self.providers.validate()?;
        self.general.validate()
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("nutri").join("config.toml"))
    }

    /// Load `.env` from the workspace root, walking up from `CARGO_MANIFEST_DIR`.
    ///
    /// Silently does nothing if no `.env` is found.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            // crate -> crates/ -> workspace root
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}
