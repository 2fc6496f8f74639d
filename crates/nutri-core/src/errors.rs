//! Cross-cutting error types for nutri.
//!
//! Domain-specific errors (`ProviderError`, `DatabaseError`, `ResolveError`)
//! live in their respective crates. `CoreError` covers failures that any crate
//! can raise while handling core types.

use thiserror::Error;

/// Errors that can be raised by any nutri crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Data failed validation (barcode shape, override fields, purge scope).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A stored or supplied enum value is not recognized.
    #[error("Unknown {kind}: '{value}'")]
    UnknownVariant { kind: &'static str, value: String },

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
