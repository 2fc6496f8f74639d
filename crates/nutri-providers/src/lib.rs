//! # nutri-providers
//!
//! Nutrition provider HTTP adapters for nutri.
//!
//! Each adapter normalizes one external source into [`CanonicalFoodResult`]:
//! - USDA FoodData Central (government food-composition database)
//! - Open Food Facts (crowd-sourced open product database)
//! - UPCitemdb (commercial UPC database)
//!
//! Adapters sit behind the [`FoodProvider`] capability trait so callers never
//! branch on provider names. [`ProviderSet`] maps each [`Provider`] to its
//! adapter.

pub mod nutrients;
pub mod openfoodfacts;
pub mod upcitemdb;
pub mod usda;

mod error;
mod http;

pub use error::ProviderError;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nutri_config::ProvidersConfig;
use nutri_core::{CanonicalFoodResult, Provider};

// ── Types ──────────────────────────────────────────────────────────

/// A parsed provider answer together with the raw response body.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    /// Raw response text, persisted with cache entries for audit.
    pub raw: String,
}

/// Per-call credentials for one provider.
///
/// Supplied by the caller on every invocation; a missing key falls back to
/// whatever the adapter was configured with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: Option<String>,
}

impl Credentials {
    #[must_use]
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
        }
    }

    /// The caller's key if non-empty, else `fallback` if non-empty.
    #[must_use]
    pub fn key_or<'a>(&'a self, fallback: &'a str) -> Option<&'a str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .or_else(|| Some(fallback).filter(|k| !k.is_empty()))
    }
}

// ── Capability ─────────────────────────────────────────────────────

/// One external nutrition source.
#[async_trait]
pub trait FoodProvider: Send + Sync {
    /// Which source this adapter speaks to.
    fn provider(&self) -> Provider;

    /// Look up a single product by barcode.
    ///
    /// When several candidates come back, the one whose embedded barcode
    /// equals `barcode` wins; otherwise the first is returned with
    /// `exact_match = false`.
    async fn lookup(
        &self,
        barcode: &str,
        credentials: &Credentials,
    ) -> Result<Fetched<CanonicalFoodResult>, ProviderError>;

    /// Free-text search returning at most `limit` results.
    async fn search(
        &self,
        query: &str,
        limit: u32,
        credentials: &Credentials,
    ) -> Result<Fetched<Vec<CanonicalFoodResult>>, ProviderError>;
}

// ── Registry ───────────────────────────────────────────────────────

/// Adapters keyed by provider.
#[derive(Clone, Default)]
pub struct ProviderSet {
    adapters: HashMap<Provider, Arc<dyn FoodProvider>>,
}

impl ProviderSet {
    /// Empty set; add adapters with [`Self::with`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the three HTTP adapters from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &ProvidersConfig) -> Result<Self, ProviderError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(timeout)
            .build()?;

        Ok(Self::new()
            .with(usda::UsdaClient::new(http.clone(), &config.usda, timeout))
            .with(openfoodfacts::OpenFoodFactsClient::new(
                http.clone(),
                &config.openfoodfacts,
                timeout,
            ))
            .with(upcitemdb::UpcItemDbClient::new(
                http,
                &config.upcitemdb,
                timeout,
            )))
    }

    /// Register `adapter`, replacing any adapter for the same provider.
    #[must_use]
    pub fn with(mut self, adapter: impl FoodProvider + 'static) -> Self {
        self.adapters.insert(adapter.provider(), Arc::new(adapter));
        self
    }

    /// Register a shared adapter.
    #[must_use]
    pub fn with_shared(mut self, adapter: Arc<dyn FoodProvider>) -> Self {
        self.adapters.insert(adapter.provider(), adapter);
        self
    }

    /// Adapter for `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Unconfigured`] if none is registered.
    pub fn get(&self, provider: Provider) -> Result<&dyn FoodProvider, ProviderError> {
        self.adapters
            .get(&provider)
            .map(Arc::as_ref)
            .ok_or(ProviderError::Unconfigured(provider))
    }

    #[must_use]
    pub fn providers(&self) -> Vec<Provider> {
        let mut providers: Vec<Provider> = self.adapters.keys().copied().collect();
        providers.sort();
        providers
    }
}

impl std::fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSet")
            .field("providers", &self.providers())
            .finish()
    }
}

/// Pick the candidate whose barcode equals `barcode`, else the first one
/// marked inexact. `None` when there are no candidates.
pub(crate) fn select_candidate(
    candidates: Vec<CanonicalFoodResult>,
    barcode: &str,
) -> Option<CanonicalFoodResult> {
    let exact = candidates
        .iter()
        .position(|c| nutri_core::identity::gtin_eq(&c.identifier, barcode));
    let (idx, exact_match) = match exact {
        Some(idx) => (idx, true),
        None => (0, false),
    };
    let mut chosen = candidates.into_iter().nth(idx)?;
    chosen.exact_match = exact_match;
    chosen.identifier = barcode.to_string();
    Some(chosen)
}
