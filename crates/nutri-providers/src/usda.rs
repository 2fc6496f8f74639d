//! USDA FoodData Central client.
//!
//! FDC has no barcode endpoint: a barcode lookup is a Branded-food search
//! for the code, followed by candidate selection on `gtinUpc`. Nutrients in
//! search results are reported per 100 g (or ml) and are scaled to the
//! declared serving when it is expressed in grams or millilitres.

use std::time::Duration;

use async_trait::async_trait;
use nutri_config::UsdaConfig;
use nutri_core::{CanonicalFoodResult, Micronutrient, Provider};

use crate::http::{fetch_text, parse_json};
use crate::nutrients::{KJ_PER_KCAL, micronutrient_key, round2};
use crate::{Credentials, Fetched, FoodProvider, ProviderError, select_candidate};

/// Page size used for barcode lookups (candidates to choose from).
const LOOKUP_PAGE_SIZE: u32 = 25;
/// FDC caps `pageSize` at 200.
const MAX_PAGE_SIZE: u32 = 200;

#[derive(serde::Deserialize)]
struct FdcSearchResponse {
    #[serde(default)]
    foods: Vec<FdcFood>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct FdcFood {
    fdc_id: i64,
    #[serde(default)]
    description: String,
    brand_owner: Option<String>,
    brand_name: Option<String>,
    gtin_upc: Option<String>,
    serving_size: Option<f64>,
    serving_size_unit: Option<String>,
    #[serde(default)]
    food_nutrients: Vec<FdcNutrient>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct FdcNutrient {
    nutrient_name: Option<String>,
    unit_name: Option<String>,
    value: Option<f64>,
}

/// HTTP adapter for FoodData Central.
pub struct UsdaClient {
    http: reqwest::Client,
    base_url: String,
    default_key: String,
    timeout: Duration,
}

impl UsdaClient {
    #[must_use]
    pub fn new(http: reqwest::Client, config: &UsdaConfig, timeout: Duration) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_key: config.api_key.clone(),
            timeout,
        }
    }

    async fn search_raw(
        &self,
        query: &str,
        page_size: u32,
        branded_only: bool,
        credentials: &Credentials,
    ) -> Result<String, ProviderError> {
        let key = credentials.key_or(&self.default_key).unwrap_or("DEMO_KEY");
        let mut url = format!(
            "{}/foods/search?api_key={}&query={}&pageSize={page_size}",
            self.base_url,
            urlencoding::encode(key),
            urlencoding::encode(query),
        );
        if branded_only {
            url.push_str("&dataType=Branded");
        }
        fetch_text(self.http.get(&url), self.timeout).await
    }
}

#[async_trait]
impl FoodProvider for UsdaClient {
    fn provider(&self) -> Provider {
        Provider::Usda
    }

    async fn lookup(
        &self,
        barcode: &str,
        credentials: &Credentials,
    ) -> Result<Fetched<CanonicalFoodResult>, ProviderError> {
        let raw = self
            .search_raw(barcode, LOOKUP_PAGE_SIZE, true, credentials)
            .await?;
        let value = parse_lookup(&raw, barcode)?;
        tracing::debug!(
            barcode,
            fdc_id = value.source_id,
            exact = value.exact_match,
            "usda lookup"
        );
        Ok(Fetched { value, raw })
    }

    async fn search(
        &self,
        query: &str,
        limit: u32,
        credentials: &Credentials,
    ) -> Result<Fetched<Vec<CanonicalFoodResult>>, ProviderError> {
        let page_size = limit.clamp(1, MAX_PAGE_SIZE);
        let raw = self.search_raw(query, page_size, false, credentials).await?;
        let mut value = parse_search(&raw)?;
        value.truncate(page_size as usize);
        Ok(Fetched { value, raw })
    }
}

/// Parse a barcode search response and select the matching candidate.
///
/// # Errors
///
/// Returns [`ProviderError::Parse`] for malformed JSON and
/// [`ProviderError::NotFound`] when FDC returns no foods.
pub fn parse_lookup(body: &str, barcode: &str) -> Result<CanonicalFoodResult, ProviderError> {
    let candidates = parse_search(body)?;
    select_candidate(candidates, barcode)
        .ok_or_else(|| ProviderError::NotFound(format!("usda has no branded food for {barcode}")))
}

/// Parse a `/foods/search` response into canonical results.
///
/// # Errors
///
/// Returns [`ProviderError::Parse`] for malformed JSON.
pub fn parse_search(body: &str) -> Result<Vec<CanonicalFoodResult>, ProviderError> {
    let data: FdcSearchResponse = parse_json(body, "usda")?;
    Ok(data.foods.into_iter().map(map_food).collect())
}

fn map_food(food: FdcFood) -> CanonicalFoodResult {
    let mut result = CanonicalFoodResult::new(Provider::Usda);
    result.source_id = food.fdc_id;
    result.description = food.description.trim().to_string();
    result.brand = food
        .brand_name
        .or(food.brand_owner)
        .unwrap_or_default()
        .trim()
        .to_string();
    result.identifier = food.gtin_upc.unwrap_or_default();

    // Figures are per 100 g/ml; scale to a metric serving when one is declared.
    let metric_unit = food
        .serving_size_unit
        .as_deref()
        .and_then(metric_serving_unit);
    let (factor, amount, unit) = match (food.serving_size, metric_unit) {
        (Some(size), Some(unit)) if size > 0.0 => (size / 100.0, size, unit),
        _ => (1.0, 100.0, "g"),
    };
    result.serving_amount = amount;
    result.serving_unit = unit.to_string();

    let mut kj: Option<f64> = None;
    for nutrient in food.food_nutrients {
        let (Some(name), Some(value)) = (nutrient.nutrient_name, nutrient.value) else {
            continue;
        };
        let unit = nutrient.unit_name.unwrap_or_default().to_lowercase();
        let scaled = round2(value * factor);
        match name.as_str() {
            "Energy" if unit == "kj" => kj = Some(scaled),
            "Energy" => result.calories = scaled,
            "Protein" => result.protein_g = scaled,
            "Carbohydrate, by difference" => result.carbs_g = scaled,
            "Total lipid (fat)" => result.fat_g = scaled,
            "Fiber, total dietary" => result.fiber_g = Some(scaled),
            "Sugars, total including NLEA" | "Total Sugars" | "Sugars, total" => {
                result.sugar_g = Some(scaled);
            }
            "Sodium, Na" => {
                result.sodium_mg = Some(if unit == "g" { round2(scaled * 1000.0) } else { scaled });
            }
            other => {
                if let Some(key) = micronutrient_key(other) {
                    result
                        .micronutrients
                        .entry(key)
                        .or_insert(Micronutrient { value: scaled, unit });
                }
            }
        }
    }
    if result.calories == 0.0 {
        if let Some(kj) = kj {
            result.calories = round2(kj / KJ_PER_KCAL);
        }
    }

    result.refresh_completeness();
    result
}

/// FDC spells grams `g`/`GRM` and millilitres `ml`/`MLT`.
fn metric_serving_unit(unit: &str) -> Option<&'static str> {
    match unit.trim().to_ascii_lowercase().as_str() {
        "g" | "grm" | "gram" | "grams" => Some("g"),
        "ml" | "mlt" | "milliliter" | "millilitre" => Some("ml"),
        _ => None,
    }
}
