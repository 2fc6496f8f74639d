//! Resolution error taxonomy.
//!
//! Input validation and store failures are terminal. Provider failures are
//! recoverable: the fallback orchestrator moves on to the next candidate and
//! reports every failure once candidates are exhausted.

use nutri_core::{CoreError, Provider};
use nutri_db::DatabaseError;
use nutri_providers::ProviderError;
use thiserror::Error;

/// Errors returned by [`crate::FoodResolver`].
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Malformed barcode, empty query, bad override, or invalid purge scope.
    #[error("invalid input: {0}")]
    InputValidation(String),

    /// One provider call failed (network, timeout, status, payload, not found).
    #[error("{provider} failed: {source}")]
    Provider {
        provider: Provider,
        source: ProviderError,
    },

    /// The override or cache store failed.
    #[error("store error: {0}")]
    Store(#[from] DatabaseError),

    /// Every barcode candidate failed.
    #[error("all providers failed: {}", .failures.join("; "))]
    AllProvidersFailed { failures: Vec<String> },

    /// No search candidate returned any result.
    #[error("no results for '{query}'{}", failure_suffix(.failures))]
    NoResults { query: String, failures: Vec<String> },

    /// The resolver could not be assembled from configuration, or a configured
    /// TTL cannot date a cache entry.
    #[error("setup failed: {0}")]
    Setup(String),
}

fn failure_suffix(failures: &[String]) -> String {
    if failures.is_empty() {
        String::new()
    } else {
        format!(" ({})", failures.join("; "))
    }
}

impl ResolveError {
    /// Whether the next fallback candidate should be tried.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }

    /// `"<provider>: <reason>"` for provider failures, the message otherwise.
    #[must_use]
    pub fn failure_reason(&self) -> String {
        match self {
            Self::Provider { provider, source } => format!("{provider}: {source}"),
            other => other.to_string(),
        }
    }

    pub(crate) const fn provider(provider: Provider, source: ProviderError) -> Self {
        Self::Provider { provider, source }
    }
}

impl From<CoreError> for ResolveError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(msg) => Self::InputValidation(msg),
            other => Self::InputValidation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_provider_failures_are_recoverable() {
        let provider = ResolveError::provider(Provider::Usda, ProviderError::Timeout { secs: 15 });
        assert!(provider.is_recoverable());
        assert_eq!(provider.failure_reason(), "usda: timed out after 15s");
        assert!(!ResolveError::InputValidation("bad".into()).is_recoverable());
        assert!(!ResolveError::Store(DatabaseError::NoResult).is_recoverable());
    }

    #[test]
    fn aggregated_failures_are_listed() {
        let err = ResolveError::AllProvidersFailed {
            failures: vec![
                "usda: timed out after 15s".into(),
                "upcitemdb: no matching item: x".into(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "all providers failed: usda: timed out after 15s; upcitemdb: no matching item: x"
        );
        let none = ResolveError::NoResults {
            query: "kale".into(),
            failures: Vec::new(),
        };
        assert_eq!(none.to_string(), "no results for 'kale'");
    }
}
