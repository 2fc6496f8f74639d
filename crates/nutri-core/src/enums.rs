//! Provider, tier, and completeness enums.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`
//! and expose `as_str()` for SQL storage, matching the serialized form.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// External nutrition data source.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// USDA FoodData Central (government food-composition database).
    Usda,
    /// Open Food Facts (crowd-sourced open product database).
    #[serde(rename = "openfoodfacts")]
    OpenFoodFacts,
    /// UPCitemdb (commercial UPC database).
    #[serde(rename = "upcitemdb")]
    UpcItemDb,
}

impl Provider {
    pub const ALL: [Self; 3] = [Self::Usda, Self::OpenFoodFacts, Self::UpcItemDb];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Usda => "usda",
            Self::OpenFoodFacts => "openfoodfacts",
            Self::UpcItemDb => "upcitemdb",
        }
    }

    /// Whether this is the government food-composition database.
    ///
    /// Its barcode lookup goes through a fuzzy full-text search, so a cached
    /// match is never upgraded to an exact one.
    #[must_use]
    pub const fn is_government(self) -> bool {
        matches!(self, Self::Usda)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "usda" | "fdc" => Ok(Self::Usda),
            "openfoodfacts" | "off" => Ok(Self::OpenFoodFacts),
            "upcitemdb" | "upc" => Ok(Self::UpcItemDb),
            other => Err(CoreError::UnknownVariant {
                kind: "provider",
                value: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// SourceTier
// ---------------------------------------------------------------------------

/// Provenance of a resolved result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    Override,
    Cache,
    Provider,
}

impl SourceTier {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::Cache => "cache",
            Self::Provider => "provider",
        }
    }
}

impl fmt::Display for SourceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// NutritionCompleteness
// ---------------------------------------------------------------------------

/// How much of a result's nutrition panel is usable.
///
/// ```text
/// unknown  → description is empty
/// complete → description, serving amount + unit, and ≥1 non-zero figure
/// partial  → anything else
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NutritionCompleteness {
    Unknown,
    Partial,
    Complete,
}

impl NutritionCompleteness {
    /// Ordering rank used by the ranking comparator (higher is better).
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Partial => 1,
            Self::Complete => 2,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Partial => "partial",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for NutritionCompleteness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_serializes_to_storage_name() {
        for provider in Provider::ALL {
            let json = serde_json::to_string(&provider).unwrap();
            assert_eq!(json, format!("\"{}\"", provider.as_str()));
        }
    }

    #[test]
    fn provider_parses_aliases() {
        assert_eq!("USDA".parse::<Provider>().unwrap(), Provider::Usda);
        assert_eq!("off".parse::<Provider>().unwrap(), Provider::OpenFoodFacts);
        assert_eq!(" upc ".parse::<Provider>().unwrap(), Provider::UpcItemDb);
        assert!(matches!(
            "nutritionix".parse::<Provider>(),
            Err(CoreError::UnknownVariant { kind: "provider", .. })
        ));
    }

    #[test]
    fn only_usda_is_government() {
        assert!(Provider::Usda.is_government());
        assert!(!Provider::OpenFoodFacts.is_government());
        assert!(!Provider::UpcItemDb.is_government());
    }

    #[test]
    fn completeness_rank_orders_tiers() {
        assert!(NutritionCompleteness::Complete.rank() > NutritionCompleteness::Partial.rank());
        assert!(NutritionCompleteness::Partial.rank() > NutritionCompleteness::Unknown.rank());
    }
}
