//! Confidence scoring configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const fn default_verified_threshold() -> f64 {
    0.80
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoringConfig {
    /// Minimum blended score for a result to count as verified.
    #[serde(default = "default_verified_threshold")]
    pub verified_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            verified_threshold: default_verified_threshold(),
        }
    }
}

impl ScoringConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.verified_threshold) {
            return Err(ConfigError::invalid(
                "scoring.verified_threshold",
                format!("must be within [0, 1], got {}", self.verified_threshold),
            ));
        }
        Ok(())
    }
}
