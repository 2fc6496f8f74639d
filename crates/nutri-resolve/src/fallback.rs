//! Fallback orchestration over ordered provider candidates.
//!
//! Barcode lookups stop at the first success. Searches visit every candidate
//! and rank the combined results. Only provider failures move on to the next
//! candidate; input and store errors end the call.

use nutri_core::identity::validate_barcode;
use nutri_core::{CanonicalFoodResult, Provider};

use crate::error::ResolveError;
use crate::rank::{dedup_and_rank, finalize};
use crate::{FoodResolver, LookupOptions, ProviderCandidate, SearchOptions};

fn ensure_candidates(candidates: &[ProviderCandidate]) -> Result<(), ResolveError> {
    if candidates.is_empty() {
        return Err(ResolveError::InputValidation(
            "at least one provider candidate is required".into(),
        ));
    }
    Ok(())
}

impl FoodResolver {
    /// Resolve `barcode` against each candidate in order until one succeeds.
    ///
    /// The result's `lookup_trail` lists every provider attempted, failures
    /// included, and `provider_failures` carries the reason for each failure.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InputValidation`] for a malformed barcode or an
    /// empty candidate list, [`ResolveError::Store`] as soon as the store
    /// fails, and [`ResolveError::AllProvidersFailed`] when every candidate
    /// failed.
    pub async fn lookup_barcode_with_fallback(
        &self,
        barcode: &str,
        candidates: &[ProviderCandidate],
    ) -> Result<CanonicalFoodResult, ResolveError> {
        ensure_candidates(candidates)?;
        let barcode = validate_barcode(barcode)?;

        let mut trail: Vec<Provider> = Vec::with_capacity(candidates.len());
        let mut failures: Vec<String> = Vec::new();

        for candidate in candidates {
            trail.push(candidate.provider);
            let options = LookupOptions {
                credentials: candidate.credentials.clone(),
                threshold: None,
            };
            match self
                .lookup_barcode(candidate.provider, barcode, &options)
                .await
            {
                Ok(mut food) => {
                    food.lookup_trail = trail;
                    food.provider_failures = failures;
                    return Ok(food);
                }
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(
                        provider = %candidate.provider,
                        barcode,
                        error = %e,
                        "provider failed, trying next candidate"
                    );
                    failures.push(e.failure_reason());
                }
                Err(e) => return Err(e),
            }
        }

        Err(ResolveError::AllProvidersFailed { failures })
    }

    /// Search every candidate in order and rank the combined results.
    ///
    /// Provider failures are skipped, logged, and listed in each returned
    /// result's `provider_failures`. Candidate order is the provider
    /// preference used to break ranking ties.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InputValidation`] for an empty query, empty
    /// candidate list, or bad limit or threshold, [`ResolveError::Store`] as
    /// soon as the store fails, and [`ResolveError::NoResults`] when the
    /// combined result set is empty.
    pub async fn search_foods_with_fallback(
        &self,
        query: &str,
        candidates: &[ProviderCandidate],
        options: &SearchOptions,
    ) -> Result<Vec<CanonicalFoodResult>, ResolveError> {
        ensure_candidates(candidates)?;
        let (normalized, limit, threshold) = self.validate_search(query, options)?;

        let mut combined: Vec<CanonicalFoodResult> = Vec::new();
        let mut trail: Vec<Provider> = Vec::with_capacity(candidates.len());
        let mut failures: Vec<String> = Vec::new();

        for candidate in candidates {
            trail.push(candidate.provider);
            match self
                .search_one(&normalized, candidate, limit, threshold)
                .await
            {
                Ok(hits) => combined.extend(hits),
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(
                        provider = %candidate.provider,
                        query = %normalized,
                        error = %e,
                        "provider search failed, skipping"
                    );
                    failures.push(e.failure_reason());
                }
                Err(e) => return Err(e),
            }
        }

        if combined.is_empty() {
            return Err(ResolveError::NoResults {
                query: normalized,
                failures,
            });
        }

        let preference: Vec<Provider> = candidates.iter().map(|c| c.provider).collect();
        let ranked = finalize(
            dedup_and_rank(combined, &preference),
            options.verified_only,
            limit as usize,
        );
        Ok(ranked
            .into_iter()
            .map(|mut food| {
                food.lookup_trail.clone_from(&trail);
                food.provider_failures.clone_from(&failures);
                food
            })
            .collect())
    }
}
