use crate::core::currency::CurrencyPair;
use crate::core::error::AcquireError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Builds the HTTP client backing one session.
pub fn build_client(source_name: &str, timeout: Duration) -> Result<Client, AcquireError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| AcquireError::session(source_name, format!("Failed to build HTTP client: {e}")))
}

/// Maps a non-success status to an acquisition error.
///
/// Returns `None` for 2xx statuses.
pub fn classify_status(
    source_name: &str,
    status: StatusCode,
    pair: &CurrencyPair,
) -> Option<AcquireError> {
    if status.is_success() {
        return None;
    }

    debug!("{} returned {} for {}", source_name, status, pair);
    let err = match status {
        StatusCode::TOO_MANY_REQUESTS => AcquireError::rate_limited(source_name),
        StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            AcquireError::not_found(source_name, pair.key())
        }
        _ => AcquireError::transient(source_name, format!("HTTP error: {status} for {pair}")),
    };
    Some(err)
}

/// Maps a transport-level failure to an acquisition error.
pub fn classify_request_error(
    source_name: &str,
    err: reqwest::Error,
    pair: &CurrencyPair,
) -> AcquireError {
    if err.is_timeout() {
        AcquireError::transient(source_name, format!("Request timed out for {pair}"))
    } else {
        AcquireError::transient(source_name, format!("Request error: {err} for {pair}"))
    }
}
