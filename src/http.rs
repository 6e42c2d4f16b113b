//! Shared HTTP client plumbing for external collaborators

use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use crate::{PlumeError, Result};

const USER_AGENT: &str = concat!("plumecast/", env!("CARGO_PKG_VERSION"));

/// Build an HTTP client with the crate's user agent and a request timeout
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| PlumeError::config(format!("Failed to create HTTP client: {e}")))
}

/// Map a response status onto the error taxonomy.
///
/// 404 means the endpoint is not deployed; every other non-2xx is treated as
/// a transient failure.
pub async fn check_status(response: Response, endpoint: &str) -> Result<Response> {
    let status = response.status();
    debug!("HTTP {} from {}", status, endpoint);

    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::NOT_FOUND {
        warn!("{} answered 404, endpoint not deployed", endpoint);
        return Err(PlumeError::endpoint_absent(endpoint));
    }

    let body = response.text().await.unwrap_or_default();
    Err(PlumeError::network(format!(
        "{} failed with status {} - {}: {}",
        endpoint,
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown error"),
        body.chars().take(200).collect::<String>()
    )))
}

/// Join a base URL and a path without doubling slashes
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
