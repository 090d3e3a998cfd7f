use defraud_core::{DefraudError, ProviderFailure, Result};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

pub(crate) fn client(service: &str, timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DefraudError::config(service, format!("cannot build HTTP client: {e}")))
}

/// Map a transport-level failure onto the provider failure taxonomy.
pub(crate) fn transport_error(service: &str, err: reqwest::Error) -> DefraudError {
    let failure = if err.is_timeout() {
        ProviderFailure::Timeout
    } else if err.is_decode() || err.is_body() {
        ProviderFailure::MalformedResponse
    } else {
        ProviderFailure::Unavailable
    };
    DefraudError::tool(service, failure, err.to_string())
}

/// Turn a non-success status into a typed failure, keeping the body text.
pub(crate) async fn check_status(service: &str, resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let failure = match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ProviderFailure::Timeout,
        _ => ProviderFailure::Unavailable,
    };
    Err(DefraudError::tool(
        service,
        failure,
        format!("{status}: {}", truncate(&body, 300)),
    ))
}

pub(crate) fn malformed(service: &str, message: impl Into<String>) -> DefraudError {
    DefraudError::tool(service, ProviderFailure::MalformedResponse, message)
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
