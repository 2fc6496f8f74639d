//! UPCitemdb client.
//!
//! UPCitemdb is a product catalogue, not a nutrition database. Nutrition is
//! only available when a seller pasted label text into the item description,
//! so results from here are usually partial. Without an API key the trial
//! endpoint is used (100 requests/day per IP).

use std::time::Duration;

use async_trait::async_trait;
use nutri_config::UpcItemDbConfig;
use nutri_core::identity::gtin_eq;
use nutri_core::{CanonicalFoodResult, Provider};

use crate::http::{fetch_text, parse_json};
use crate::nutrients::{parse_labeled_nutrients, parse_quantity};
use crate::{Credentials, Fetched, FoodProvider, ProviderError};

#[derive(serde::Deserialize)]
struct UpcResponse {
    #[serde(default)]
    code: String,
    message: Option<String>,
    #[serde(default)]
    items: Vec<UpcItem>,
}

#[derive(serde::Deserialize)]
struct UpcItem {
    ean: Option<String>,
    upc: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    brand: String,
    #[serde(default)]
    description: String,
    size: Option<String>,
}

/// HTTP adapter for UPCitemdb.
pub struct UpcItemDbClient {
    http: reqwest::Client,
    base_url: String,
    trial_base_url: String,
    default_key: String,
    timeout: Duration,
}

impl UpcItemDbClient {
    #[must_use]
    pub fn new(http: reqwest::Client, config: &UpcItemDbConfig, timeout: Duration) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            trial_base_url: config.trial_base_url.trim_end_matches('/').to_string(),
            default_key: config.api_key.clone(),
            timeout,
        }
    }

    async fn get(&self, path: &str, credentials: &Credentials) -> Result<String, ProviderError> {
        let request = match credentials.key_or(&self.default_key) {
            Some(key) => self
                .http
                .get(format!("{}{path}", self.base_url))
                .header("user_key", key)
                .header("key_type", "3scale"),
            None => self.http.get(format!("{}{path}", self.trial_base_url)),
        };
        fetch_text(request, self.timeout).await
    }
}

#[async_trait]
impl FoodProvider for UpcItemDbClient {
    fn provider(&self) -> Provider {
        Provider::UpcItemDb
    }

    async fn lookup(
        &self,
        barcode: &str,
        credentials: &Credentials,
    ) -> Result<Fetched<CanonicalFoodResult>, ProviderError> {
        let path = format!("/lookup?upc={}", urlencoding::encode(barcode));
        let raw = self.get(&path, credentials).await?;
        let value = parse_lookup(&raw, barcode)?;
        tracing::debug!(barcode, exact = value.exact_match, "upcitemdb lookup");
        Ok(Fetched { value, raw })
    }

    async fn search(
        &self,
        query: &str,
        limit: u32,
        credentials: &Credentials,
    ) -> Result<Fetched<Vec<CanonicalFoodResult>>, ProviderError> {
        let path = format!(
            "/search?s={}&match_mode=0&type=product",
            urlencoding::encode(query)
        );
        let raw = self.get(&path, credentials).await?;
        let value = parse_search(&raw, limit as usize)?;
        Ok(Fetched { value, raw })
    }
}

/// Parse a `/lookup` response for `barcode`.
///
/// # Errors
///
/// Returns [`ProviderError::Parse`] for malformed JSON,
/// [`ProviderError::Api`] when the body carries a non-`OK` code, and
/// [`ProviderError::NotFound`] when no items came back.
pub fn parse_lookup(body: &str, barcode: &str) -> Result<CanonicalFoodResult, ProviderError> {
    let mut items = parse_body(body)?.items;
    if items.is_empty() {
        return Err(ProviderError::NotFound(format!(
            "upcitemdb has no item {barcode}"
        )));
    }
    let (idx, exact_match) = items
        .iter()
        .position(|item| item_matches(item, barcode))
        .map_or((0, false), |idx| (idx, true));
    let mut result = map_item(items.swap_remove(idx));
    result.identifier = barcode.to_string();
    result.exact_match = exact_match;
    Ok(result)
}

/// Parse a `/search` response, keeping at most `limit` items.
///
/// # Errors
///
/// Returns [`ProviderError::Parse`] for malformed JSON and
/// [`ProviderError::Api`] when the body carries a non-`OK` code.
pub fn parse_search(body: &str, limit: usize) -> Result<Vec<CanonicalFoodResult>, ProviderError> {
    let data = parse_body(body)?;
    Ok(data
        .items
        .into_iter()
        .map(map_item)
        .filter(|food| !food.description.is_empty())
        .take(limit)
        .collect())
}

fn parse_body(body: &str) -> Result<UpcResponse, ProviderError> {
    let data: UpcResponse = parse_json(body, "upcitemdb")?;
    if !data.code.is_empty() && data.code != "OK" {
        return Err(ProviderError::Api {
            status: 200,
            message: format!(
                "{}: {}",
                data.code,
                data.message.as_deref().unwrap_or("no message")
            ),
        });
    }
    Ok(data)
}

fn item_matches(item: &UpcItem, barcode: &str) -> bool {
    [&item.upc, &item.ean]
        .into_iter()
        .flatten()
        .any(|code| gtin_eq(code, barcode))
}

fn map_item(item: UpcItem) -> CanonicalFoodResult {
    let mut result = CanonicalFoodResult::new(Provider::UpcItemDb);
    result.identifier = item.upc.or(item.ean).unwrap_or_default();
    result.description = item.title.trim().to_string();
    result.brand = item.brand.trim().to_string();
    if let Some((amount, unit)) = item.size.as_deref().and_then(parse_quantity) {
        if amount > 0.0 && !unit.is_empty() {
            result.serving_amount = amount;
            result.serving_unit = unit;
        }
    }

    let label = parse_labeled_nutrients(&item.description);
    result.calories = label.calories.unwrap_or_default();
    result.protein_g = label.protein_g.unwrap_or_default();
    result.carbs_g = label.carbs_g.unwrap_or_default();
    result.fat_g = label.fat_g.unwrap_or_default();
    result.fiber_g = label.fiber_g;
    result.sugar_g = label.sugar_g;
    result.sodium_mg = label.sodium_mg;

    result.refresh_completeness();
    result
}
