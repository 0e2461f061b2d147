//! HTTP plumbing shared by every adapter.

use agentloom_core::error::TransportError;
use std::time::Duration;
use tracing::warn;

/// Per-request timeout. The turn bound in the loop is the only other limit.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub(crate) fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

/// Map the status line and decode a JSON body.
///
/// 429 → `RateLimited`, 401/403 → `AuthenticationFailed`, any other
/// non-success → `Api`.
pub(crate) async fn read_json(
    provider: &str,
    response: reqwest::Response,
) -> std::result::Result<serde_json::Value, TransportError> {
    let status = response.status().as_u16();

    if status == 429 {
        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);
        return Err(TransportError::RateLimited { retry_after_secs });
    }

    if status == 401 || status == 403 {
        return Err(TransportError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ));
    }

    if !response.status().is_success() {
        let error_body = response.text().await.unwrap_or_default();
        warn!(provider, status, body = %error_body, "Provider returned error");
        return Err(TransportError::Api {
            status_code: status,
            message: error_body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| TransportError::MalformedResponse(format!("Failed to parse response: {e}")))
}

pub(crate) fn network_error(e: reqwest::Error) -> TransportError {
    TransportError::Network(e.to_string())
}
