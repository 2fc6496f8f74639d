//! Open Food Facts client.
//!
//! Product lookups use the v2 product endpoint; searches use the legacy
//! `cgi/search.pl` JSON interface, which still offers the best full-text
//! matching. Both return the same product shape.

use std::time::Duration;

use async_trait::async_trait;
use nutri_config::OpenFoodFactsConfig;
use nutri_core::identity::gtin_eq;
use nutri_core::{CanonicalFoodResult, Micronutrient, Provider};
use serde_json::{Map, Value};

use crate::http::{fetch_text, parse_json};
use crate::nutrients::{KJ_PER_KCAL, micronutrient_key, parse_quantity, round2, value_as_f64};
use crate::{Credentials, Fetched, FoodProvider, ProviderError};

/// Sodium is derived from salt when absent (salt = sodium × 2.5).
const SALT_PER_SODIUM: f64 = 2.5;

/// `*_100g` keys that are scores or already-mapped figures, not nutrients.
const NON_NUTRIENT_PREFIXES: [&str; 6] = [
    "nutrition-score",
    "nova",
    "fruits-vegetables",
    "carbon-footprint",
    "energy",
    "salt",
];

const CORE_NUTRIENTS: [&str; 7] = [
    "proteins",
    "carbohydrates",
    "fat",
    "fiber",
    "sugars",
    "sodium",
    "alcohol",
];

#[derive(serde::Deserialize)]
struct ProductResponse {
    code: Option<String>,
    #[serde(default)]
    status: i64,
    product: Option<OffProduct>,
}

#[derive(serde::Deserialize)]
struct SearchResponse {
    #[serde(default)]
    products: Vec<OffProduct>,
}

#[derive(serde::Deserialize)]
struct OffProduct {
    code: Option<String>,
    product_name: Option<String>,
    generic_name: Option<String>,
    brands: Option<String>,
    serving_size: Option<String>,
    #[serde(default)]
    serving_quantity: Value,
    serving_quantity_unit: Option<String>,
    #[serde(default)]
    nutriments: Map<String, Value>,
}

/// HTTP adapter for Open Food Facts.
pub struct OpenFoodFactsClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl OpenFoodFactsClient {
    #[must_use]
    pub fn new(http: reqwest::Client, config: &OpenFoodFactsConfig, timeout: Duration) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl FoodProvider for OpenFoodFactsClient {
    fn provider(&self) -> Provider {
        Provider::OpenFoodFacts
    }

    async fn lookup(
        &self,
        barcode: &str,
        _credentials: &Credentials,
    ) -> Result<Fetched<CanonicalFoodResult>, ProviderError> {
        let url = format!(
            "{}/api/v2/product/{}.json",
            self.base_url,
            urlencoding::encode(barcode)
        );
        let raw = match fetch_text(self.http.get(&url), self.timeout).await {
            Ok(raw) => raw,
            // v2 answers unknown products with 404 and a status-0 body
            Err(ProviderError::Api { status: 404, .. }) => {
                return Err(ProviderError::NotFound(format!(
                    "openfoodfacts has no product {barcode}"
                )));
            }
            Err(e) => return Err(e),
        };
        let value = parse_lookup(&raw, barcode)?;
        tracing::debug!(barcode, exact = value.exact_match, "openfoodfacts lookup");
        Ok(Fetched { value, raw })
    }

    async fn search(
        &self,
        query: &str,
        limit: u32,
        _credentials: &Credentials,
    ) -> Result<Fetched<Vec<CanonicalFoodResult>>, ProviderError> {
        let url = format!(
            "{}/cgi/search.pl?search_terms={}&search_simple=1&action=process&json=1&page_size={}",
            self.base_url,
            urlencoding::encode(query),
            limit.max(1),
        );
        let raw = fetch_text(self.http.get(&url), self.timeout).await?;
        let value = parse_search(&raw, limit as usize)?;
        Ok(Fetched { value, raw })
    }
}

/// Parse a v2 product response for `barcode`.
///
/// # Errors
///
/// Returns [`ProviderError::Parse`] for malformed JSON and
/// [`ProviderError::NotFound`] when `status` is 0 or no product is present.
pub fn parse_lookup(body: &str, barcode: &str) -> Result<CanonicalFoodResult, ProviderError> {
    let data: ProductResponse = parse_json(body, "openfoodfacts")?;
    let product = match data.product {
        Some(product) if data.status != 0 => product,
        _ => {
            return Err(ProviderError::NotFound(format!(
                "openfoodfacts has no product {barcode}"
            )));
        }
    };
    let code = data.code.or_else(|| product.code.clone());
    let exact_match = code.as_deref().is_none_or(|c| gtin_eq(c, barcode));

    let mut result = map_product(product);
    result.identifier = barcode.to_string();
    result.exact_match = exact_match;
    Ok(result)
}

/// Parse a search response, keeping at most `limit` named products.
///
/// # Errors
///
/// Returns [`ProviderError::Parse`] for malformed JSON.
pub fn parse_search(body: &str, limit: usize) -> Result<Vec<CanonicalFoodResult>, ProviderError> {
    let data: SearchResponse = parse_json(body, "openfoodfacts")?;
    Ok(data
        .products
        .into_iter()
        .map(map_product)
        .filter(|food| !food.description.is_empty())
        .take(limit)
        .collect())
}

fn map_product(product: OffProduct) -> CanonicalFoodResult {
    let mut result = CanonicalFoodResult::new(Provider::OpenFoodFacts);
    result.identifier = product.code.unwrap_or_default();
    result.description = product
        .product_name
        .filter(|n| !n.trim().is_empty())
        .or(product.generic_name)
        .unwrap_or_default()
        .trim()
        .to_string();
    result.brand = product
        .brands
        .as_deref()
        .and_then(|b| b.split(',').next())
        .unwrap_or_default()
        .trim()
        .to_string();

    let quantity = value_as_f64(&product.serving_quantity).filter(|q| *q > 0.0);
    let nutriments = Nutriments {
        map: &product.nutriments,
        serving_quantity: quantity,
    };
    match quantity {
        Some(quantity) => {
            result.serving_amount = quantity;
            result.serving_unit = product
                .serving_quantity_unit
                .filter(|u| !u.trim().is_empty())
                .or_else(|| {
                    product
                        .serving_size
                        .as_deref()
                        .and_then(parse_quantity)
                        .map(|(_, unit)| unit)
                        .filter(|u| !u.is_empty())
                })
                .unwrap_or_else(|| "g".to_string())
                .to_lowercase();
        }
        None => {
            result.serving_amount = 100.0;
            result.serving_unit = "g".to_string();
        }
    }

    result.calories = nutriments
        .get("energy-kcal")
        .or_else(|| nutriments.get("energy").map(|kj| kj / KJ_PER_KCAL))
        .map_or(0.0, round2);
    result.protein_g = nutriments.get("proteins").map_or(0.0, round2);
    result.carbs_g = nutriments.get("carbohydrates").map_or(0.0, round2);
    result.fat_g = nutriments.get("fat").map_or(0.0, round2);
    result.fiber_g = nutriments.get("fiber").map(round2);
    result.sugar_g = nutriments.get("sugars").map(round2);
    result.sodium_mg = nutriments
        .get("sodium")
        .or_else(|| nutriments.get("salt").map(|salt| salt / SALT_PER_SODIUM))
        .map(|grams| round2(grams * 1000.0));

    for key in product.nutriments.keys() {
        let Some(name) = key.strip_suffix("_100g") else {
            continue;
        };
        if CORE_NUTRIENTS.contains(&name)
            || NON_NUTRIENT_PREFIXES.iter().any(|p| name.starts_with(p))
        {
            continue;
        }
        let (Some(grams), Some(micro_key)) = (nutriments.get(name), micronutrient_key(name))
        else {
            continue;
        };
        let declared = product
            .nutriments
            .get(&format!("{name}_unit"))
            .and_then(Value::as_str)
            .unwrap_or("g");
        result
            .micronutrients
            .insert(micro_key, express_in_unit(grams, declared));
    }

    result.refresh_completeness();
    result
}

/// Mass nutrients are normalized to grams; re-express them in the unit the
/// product declared.
fn express_in_unit(grams: f64, declared: &str) -> Micronutrient {
    let (factor, unit) = match declared.trim().to_lowercase().as_str() {
        "mg" => (1_000.0, "mg"),
        "µg" | "mcg" | "ug" => (1_000_000.0, "µg"),
        _ => (1.0, "g"),
    };
    Micronutrient {
        value: round2(grams * factor),
        unit: unit.to_string(),
    }
}

/// Per-serving view over an OFF `nutriments` object.
struct Nutriments<'a> {
    map: &'a Map<String, Value>,
    serving_quantity: Option<f64>,
}

impl Nutriments<'_> {
    /// `name` for the chosen serving: `_serving` when available, else
    /// `_100g` scaled to the serving quantity (or as-is for a 100 g serving).
    fn get(&self, name: &str) -> Option<f64> {
        let field = |suffix: &str| {
            self.map
                .get(&format!("{name}{suffix}"))
                .and_then(value_as_f64)
        };
        match self.serving_quantity {
            Some(quantity) => {
                field("_serving").or_else(|| field("_100g").map(|v| v * quantity / 100.0))
            }
            None => field("_100g"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutri_core::NutritionCompleteness;
    use pretty_assertions::assert_eq;

    const PRODUCT: &str = r#"{
        "code": "3017620422003",
        "status": 1,
        "status_verbose": "product found",
        "product": {
            "code": "3017620422003",
            "product_name": "Nutella",
            "brands": "Ferrero, Nutella",
            "serving_size": "15 g",
            "serving_quantity": "15",
            "nutriments": {
                "energy-kcal_100g": 539,
                "energy-kcal_serving": 80.9,
                "energy_100g": 2255,
                "proteins_100g": 6.3,
                "proteins_serving": 0.946,
                "carbohydrates_100g": 57.5,
                "carbohydrates_serving": 8.62,
                "fat_100g": 30.9,
                "fat_serving": 4.63,
                "sugars_100g": 56.3,
                "sugars_serving": 8.44,
                "salt_100g": 0.107,
                "sodium_100g": 0.0428,
                "sodium_serving": 0.00642,
                "calcium_100g": 0.108,
                "calcium_unit": "mg",
                "nutrition-score-fr_100g": 26,
                "nova-group_100g": 4
            }
        }
    }"#;

    const SEARCH: &str = r#"{
        "count": 3,
        "page_size": 24,
        "products": [
            {
                "code": "0012345678905",
                "product_name": "Greek Yogurt Plain",
                "brands": "Acme",
                "nutriments": {
                    "energy_100g": 247,
                    "proteins_100g": 10,
                    "carbohydrates_100g": 3.6,
                    "fat_100g": 0.4
                }
            },
            {
                "code": "0000000000001",
                "product_name": "",
                "nutriments": {}
            },
            {
                "code": "0099999000001",
                "product_name": "Greek Yogurt Honey",
                "brands": "Other",
                "nutriments": {}
            }
        ]
    }"#;

    #[test]
    fn lookup_maps_serving_figures() {
        let food = parse_lookup(PRODUCT, "3017620422003").unwrap();
        assert_eq!(food.description, "Nutella");
        assert_eq!(food.brand, "Ferrero");
        assert_eq!(food.serving_amount, 15.0);
        assert_eq!(food.serving_unit, "g");
        assert_eq!(food.calories, 80.9);
        assert_eq!(food.protein_g, 0.95);
        assert_eq!(food.carbs_g, 8.62);
        assert_eq!(food.fat_g, 4.63);
        assert_eq!(food.sugar_g, Some(8.44));
        assert_eq!(food.sodium_mg, Some(6.42));
        assert!(food.fiber_g.is_none());
        assert!(food.exact_match);
        assert_eq!(food.nutrition_completeness, NutritionCompleteness::Complete);
    }

    #[test]
    fn micronutrients_use_declared_unit_and_skip_scores() {
        let food = parse_lookup(PRODUCT, "3017620422003").unwrap();
        assert_eq!(food.micronutrients.len(), 1);
        let calcium = &food.micronutrients["calcium"];
        assert_eq!(calcium.unit, "mg");
        // 0.108 g per 100 g, scaled to 15 g
        assert_eq!(calcium.value, 16.2);
    }

    #[test]
    fn padded_barcode_is_still_exact() {
        let food = parse_lookup(PRODUCT, "03017620422003").unwrap();
        assert!(food.exact_match);
        assert_eq!(food.identifier, "03017620422003");
    }

    #[test]
    fn status_zero_is_not_found() {
        let body = r#"{"code": "0000000000000", "status": 0, "status_verbose": "product not found"}"#;
        let err = parse_lookup(body, "00000000").unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[test]
    fn search_without_serving_reports_per_100g() {
        let foods = parse_search(SEARCH, 10).unwrap();
        assert_eq!(foods.len(), 2);
        let yogurt = &foods[0];
        assert_eq!(yogurt.identifier, "0012345678905");
        assert_eq!(yogurt.serving_amount, 100.0);
        assert_eq!(yogurt.serving_unit, "g");
        assert_eq!(yogurt.calories, 59.03);
        assert_eq!(yogurt.protein_g, 10.0);
        assert!(yogurt.sodium_mg.is_none());
    }

    #[test]
    fn search_skips_unnamed_and_respects_limit() {
        let foods = parse_search(SEARCH, 1).unwrap();
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0].description, "Greek Yogurt Plain");
    }

    #[test]
    fn sodium_derived_from_salt() {
        let body = r#"{"status": 1, "product": {
            "product_name": "Crackers",
            "nutriments": {"salt_100g": 1.5, "energy-kcal_100g": 420}
        }}"#;
        let food = parse_lookup(body, "12345670").unwrap();
        assert_eq!(food.sodium_mg, Some(600.0));
        assert_eq!(food.calories, 420.0);
    }

    #[tokio::test]
    #[ignore] // requires network
    async fn live_lookup_nutella() {
        let client = OpenFoodFactsClient::new(
            reqwest::Client::new(),
            &OpenFoodFactsConfig::default(),
            Duration::from_secs(15),
        );
        let fetched = client
            .lookup("3017620422003", &Credentials::default())
            .await
            .unwrap();
        assert!(!fetched.value.description.is_empty());
        assert!(!fetched.raw.is_empty());
    }
}
