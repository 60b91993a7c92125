//! HTTP client initialization.

use std::sync::Arc;

use reqwest::ClientBuilder;

use crate::config::{TimeoutConfig, TCP_CONNECT_TIMEOUT};
use crate::error_handling::InitializationError;

/// Initializes the shared HTTP client used by every case in a scenario.
///
/// Creates a `reqwest::Client` configured with:
/// - Redirects disabled (the executor captures or follows them itself)
/// - Timeout from `request_timeout`, so a hung connection never outlives one attempt
/// - Connect timeout capped at `TCP_CONNECT_TIMEOUT`
/// - User-Agent from the caller
///
/// The client (and its connection pool) is shared read-only across concurrent
/// cases; nothing mutates it after construction.
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if client creation fails.
pub fn init_client(
    timeouts: &TimeoutConfig,
    user_agent: &str,
    accept_invalid_certs: bool,
) -> Result<Arc<reqwest::Client>, InitializationError> {
    let client = ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeouts.request_timeout)
        .connect_timeout(TCP_CONNECT_TIMEOUT.min(timeouts.request_timeout))
        .user_agent(user_agent)
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_init_client_with_defaults() {
        let client = init_client(&TimeoutConfig::default(), "gateway_conformance/test", false);
        assert!(client.is_ok());
    }

    #[test]
    fn test_init_client_with_short_request_timeout() {
        let timeouts = TimeoutConfig {
            request_timeout: Duration::from_millis(500),
            ..Default::default()
        };
        assert!(init_client(&timeouts, "gateway_conformance/test", true).is_ok());
    }
}
