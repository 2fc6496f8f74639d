//! User override management.
//!
//! An override replaces whatever a provider says about a barcode and wins
//! over every other tier. Records never expire.

use nutri_core::overrides::{OverrideRecord, validate_override_food, validate_override_key};
use nutri_core::{CanonicalFoodResult, Provider, SourceTier};

use crate::FoodResolver;
use crate::error::ResolveError;

impl FoodResolver {
    /// Create or replace the override for (provider, barcode).
    ///
    /// The stored snapshot carries no resolution metadata. On replace the
    /// original `created_at` is kept.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InputValidation`] for a malformed barcode or
    /// nutrition figure and [`ResolveError::Store`] when the write fails.
    pub async fn set_override(
        &self,
        provider: Provider,
        barcode: &str,
        food: CanonicalFoodResult,
        notes: &str,
    ) -> Result<OverrideRecord, ResolveError> {
        let barcode = validate_override_key(barcode)?;
        validate_override_food(&food)?;

        let mut food = food.into_snapshot();
        food.provider = provider;
        food.identifier.clone_from(&barcode);
        food.source_tier = SourceTier::Override;
        food.exact_match = true;
        food.refresh_completeness();

        let now = self.now();
        let record = OverrideRecord {
            provider,
            barcode,
            food,
            notes: notes.trim().to_string(),
            created_at: now,
            updated_at: now,
        };
        let stored = self.store.upsert_override(&record).await?;
        tracing::info!(%provider, barcode = %stored.barcode, "override saved");
        Ok(stored)
    }

    /// # Errors
    ///
    /// Returns [`ResolveError::InputValidation`] for a malformed barcode and
    /// [`ResolveError::Store`] when the read fails.
    pub async fn get_override(
        &self,
        provider: Provider,
        barcode: &str,
    ) -> Result<Option<OverrideRecord>, ResolveError> {
        let barcode = validate_override_key(barcode)?;
        Ok(self.store.get_override(provider, &barcode).await?)
    }

    /// Remove the override; returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InputValidation`] for a malformed barcode and
    /// [`ResolveError::Store`] when the delete fails.
    pub async fn delete_override(
        &self,
        provider: Provider,
        barcode: &str,
    ) -> Result<bool, ResolveError> {
        let barcode = validate_override_key(barcode)?;
        let removed = self.store.delete_override(provider, &barcode).await?;
        if removed {
            tracing::info!(%provider, barcode = %barcode, "override deleted");
        }
        Ok(removed)
    }

    /// All overrides, optionally for one provider, ordered by provider then
    /// barcode.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Store`] when the read fails.
    pub async fn list_overrides(
        &self,
        provider: Option<Provider>,
    ) -> Result<Vec<OverrideRecord>, ResolveError> {
        Ok(self.store.list_overrides(provider).await?)
    }
}
