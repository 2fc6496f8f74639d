//! Provider error types.

use nutri_core::Provider;
use thiserror::Error;

/// Errors that can occur when talking to a nutrition provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider API returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// The provider returned a 429 Too Many Requests response.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Failed to parse a provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The provider answered but holds no matching item.
    #[error("no matching item: {0}")]
    NotFound(String),

    /// The call exceeded its time budget.
    #[error("timed out after {secs}s")]
    Timeout {
        /// Budget that was exceeded.
        secs: u64,
    },

    /// No adapter is registered for the requested provider.
    #[error("provider '{0}' is not configured")]
    Unconfigured(Provider),
}

impl ProviderError {
    /// Map a transport error, folding client-side timeouts into [`Self::Timeout`].
    pub(crate) fn from_transport(e: reqwest::Error, timeout_secs: u64) -> Self {
        if e.is_timeout() {
            Self::Timeout { secs: timeout_secs }
        } else {
            Self::Http(e)
        }
    }
}
