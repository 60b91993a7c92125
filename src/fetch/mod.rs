//! Round-trip executor.
//!
//! Performs exactly one logical HTTP exchange against the gateway: a single
//! request, or a bounded chain of requests when the descriptor asks for redirects
//! to be followed. There is no retry logic here; deciding whether the gateway has
//! settled belongs to the poller.

mod redirects;
mod request;

use std::future::Future;
use std::sync::Arc;

use log::debug;
use reqwest::header::LOCATION;

use crate::config::{TimeoutConfig, FOLLOWED_REDIRECT_STATUS_CODES};
use crate::error_handling::{
    InitializationError, MalformedRedirectError, RoundTripError, TransportError,
    TransportErrorKind,
};
use crate::initialization::init_client;
use crate::models::{is_redirect_status, GatewayAddress, ObservedResponse, RequestDescriptor};

pub use redirects::{LocationError, LocationForm};
use request::{build_request, collect_headers, redirect_method};

/// One mechanical HTTP attempt against the gateway.
///
/// The poller is generic over this trait so it can be driven by a scripted
/// transport in tests.
pub trait RoundTripper: Send + Sync {
    fn round_trip(
        &self,
        gateway: &GatewayAddress,
        request: &RequestDescriptor,
    ) -> impl Future<Output = Result<ObservedResponse, RoundTripError>> + Send;
}

/// `RoundTripper` backed by a shared `reqwest::Client`.
///
/// The client must have automatic redirects disabled: redirects are either
/// captured for inspection or followed here, hop by hop.
#[derive(Debug, Clone)]
pub struct HttpRoundTripper {
    client: Arc<reqwest::Client>,
    max_redirect_hops: usize,
}

impl HttpRoundTripper {
    pub fn new(client: Arc<reqwest::Client>, max_redirect_hops: usize) -> Self {
        Self {
            client,
            max_redirect_hops,
        }
    }

    /// Builds a dedicated client from the scenario timing configuration.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::HttpClientError` if the client cannot be built.
    pub fn from_config(
        timeouts: &TimeoutConfig,
        user_agent: &str,
        accept_invalid_certs: bool,
    ) -> Result<Self, InitializationError> {
        let client = init_client(timeouts, user_agent, accept_invalid_certs)?;
        Ok(Self::new(client, timeouts.max_redirect_hops))
    }
}

impl RoundTripper for HttpRoundTripper {
    async fn round_trip(
        &self,
        gateway: &GatewayAddress,
        request: &RequestDescriptor,
    ) -> Result<ObservedResponse, RoundTripError> {
        let mut url = gateway.url_for(request.path()).map_err(|e| {
            TransportError::new(
                TransportErrorKind::Builder,
                format!("cannot build URL for {}{}: {}", gateway, request.path(), e),
            )
        })?;
        let mut method = request.http_method().ok_or_else(|| {
            TransportError::new(
                TransportErrorKind::Builder,
                format!("invalid HTTP method '{}'", request.method()),
            )
        })?;
        let mut host_override = request.host().map(str::to_string);
        let mut hops = 0usize;

        loop {
            let response = build_request(
                &self.client,
                method.clone(),
                url.clone(),
                request,
                host_override.as_deref(),
            )
            .send()
            .await
            .map_err(TransportError::from)?;

            let status_code = response.status().as_u16();
            let headers = collect_headers(response.headers());
            let location = response
                .headers()
                .get(LOCATION)
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

            let location = match location {
                Some(location) if is_redirect_status(status_code) => location,
                _ => {
                    return Ok(ObservedResponse {
                        status_code,
                        headers,
                        redirect: None,
                        hops,
                    })
                }
            };

            let malformed = |reason: String| MalformedRedirectError {
                status_code,
                location: location.clone(),
                reason,
            };
            let form = LocationForm::parse(&location).map_err(|e| malformed(e.to_string()))?;

            // 300 and 304-306 carry a Location that is never followed
            let follow =
                request.follow_redirects() && FOLLOWED_REDIRECT_STATUS_CODES.contains(&status_code);
            if !follow {
                return Ok(ObservedResponse {
                    status_code,
                    headers,
                    redirect: Some(form.into_target()),
                    hops,
                });
            }

            if hops >= self.max_redirect_hops {
                return Err(TransportError::new(
                    TransportErrorKind::TooManyRedirects,
                    format!("stopped after {} redirect hops at {}", hops, url),
                )
                .into());
            }

            let next = url
                .join(&location)
                .map_err(|e| malformed(e.to_string()))?;
            if form.changes_origin() {
                host_override = None;
            }
            method = redirect_method(status_code, &method);
            hops += 1;
            debug!("Following {} redirect {} -> {} (hop {})", status_code, url, next, hops);
            url = next;
        }
    }
}

#[cfg(test)]
mod tests;
