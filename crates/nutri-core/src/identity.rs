//! Barcode shape validation and search-query normalization.

use crate::errors::CoreError;

/// Shortest accepted barcode (EAN-8).
pub const MIN_BARCODE_LEN: usize = 8;
/// Longest accepted barcode (GTIN-14).
pub const MAX_BARCODE_LEN: usize = 14;

/// Validate a barcode's shape and return it trimmed.
///
/// A valid barcode is 8–14 ASCII digits. Check digits are not verified.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] for any other input.
pub fn validate_barcode(raw: &str) -> Result<&str, CoreError> {
    let barcode = raw.trim();
    if barcode.is_empty() {
        return Err(CoreError::validation("barcode is required"));
    }
    if !barcode.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::validation(format!(
            "barcode '{barcode}' must contain only digits"
        )));
    }
    if !(MIN_BARCODE_LEN..=MAX_BARCODE_LEN).contains(&barcode.len()) {
        return Err(CoreError::validation(format!(
            "barcode '{barcode}' must be {MIN_BARCODE_LEN}-{MAX_BARCODE_LEN} digits, got {}",
            barcode.len()
        )));
    }
    Ok(barcode)
}

/// Compare two GTIN-family codes ignoring leading zero padding.
///
/// UPC-A `012345678905` and EAN-13 `0012345678905` name the same item.
#[must_use]
pub fn gtin_eq(a: &str, b: &str) -> bool {
    let a = a.trim().trim_start_matches('0');
    let b = b.trim().trim_start_matches('0');
    !a.is_empty() && a == b
}

/// Normalize a free-text query into its cache-key form.
///
/// Lowercases, trims, and collapses internal whitespace runs to one space.
#[must_use]
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Validate a search query and return its normalized form.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] if the query is blank.
pub fn validate_query(query: &str) -> Result<String, CoreError> {
    let normalized = normalize_query(query);
    if normalized.is_empty() {
        return Err(CoreError::validation("search query must not be empty"));
    }
    Ok(normalized)
}
