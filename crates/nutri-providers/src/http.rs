//! Shared HTTP helpers for provider adapters.
//!
//! Centralizes status-code checks (429 rate limiting with `Retry-After`
//! parsing, non-success → [`ProviderError::Api`]) and body reading so the
//! adapters stay focused on request construction and response mapping.

use std::time::Duration;

use crate::error::ProviderError;

/// Longest response-body excerpt carried in an [`ProviderError::Api`] message.
const MAX_ERROR_BODY: usize = 512;

/// Check an HTTP response for common error conditions.
///
/// Returns the response unchanged on success. Handles:
/// - **429 Too Many Requests** → [`ProviderError::RateLimited`] with
///   `Retry-After` header parsing (falls back to 60 s if absent or
///   unparseable).
/// - **Non-success status** → [`ProviderError::Api`] with status code and
///   a truncated response body.
pub async fn check_response(
    resp: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    if resp.status() == 429 {
        let retry_after = parse_retry_after(&resp);
        return Err(ProviderError::RateLimited {
            retry_after_secs: retry_after,
        });
    }
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let mut message = resp.text().await.unwrap_or_default();
        if message.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|i| message.is_char_boundary(*i))
                .unwrap_or(0);
            message.truncate(cut);
        }
        return Err(ProviderError::Api { status, message });
    }
    Ok(resp)
}

/// Send a request and return the body text of a successful response.
///
/// Transport timeouts become [`ProviderError::Timeout`] carrying `timeout`.
pub async fn fetch_text(
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<String, ProviderError> {
    let secs = timeout.as_secs();
    let resp = request
        .send()
        .await
        .map_err(|e| ProviderError::from_transport(e, secs))?;
    tracing::debug!(url = %resp.url(), status = resp.status().as_u16(), "provider response");
    let resp = check_response(resp).await?;
    resp.text()
        .await
        .map_err(|e| ProviderError::from_transport(e, secs))
}

/// Parse a JSON body, naming the provider in the error.
pub fn parse_json<T: serde::de::DeserializeOwned>(
    body: &str,
    provider: &str,
) -> Result<T, ProviderError> {
    serde_json::from_str(body)
        .map_err(|e| ProviderError::Parse(format!("{provider} response: {e}")))
}

/// Parse the `Retry-After` header as seconds, falling back to 60 s.
fn parse_retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60)
}
