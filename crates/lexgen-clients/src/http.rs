//! Shared HTTP plumbing
//!
//! One `reqwest::Client` serves every adapter; transport errors are
//! folded into `ServiceError`.

use lexgen_core::ServiceError;
use std::time::Duration;

const USER_AGENT: &str = concat!("lexgen/", env!("CARGO_PKG_VERSION"));
const BODY_EXCERPT_CHARS: usize = 200;

/// Build the shared client
///
/// # Errors
/// - `ServiceError::NotConfigured` if the TLS backend cannot initialize
pub fn build_client(
    connect_timeout: Duration,
    total_timeout: Duration,
) -> Result<reqwest::Client, ServiceError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(connect_timeout)
        .timeout(total_timeout)
        .build()
        .map_err(|e| ServiceError::NotConfigured(format!("http client: {e}")))
}

/// Map a transport error
pub(crate) fn transport_error(error: &reqwest::Error, timeout: Duration) -> ServiceError {
    if error.is_timeout() {
        ServiceError::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    } else {
        ServiceError::Transport(error.to_string())
    }
}

/// Read a body, failing on non-success status
pub(crate) async fn success_body(
    response: reqwest::Response,
    timeout: Duration,
) -> Result<String, ServiceError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(&e, timeout))?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(ServiceError::Status {
            status: status.as_u16(),
            message: excerpt(&body),
        })
    }
}

/// First characters of a body for error messages
pub(crate) fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Join a base URL and a path without doubling slashes
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
