// Scripted transport shared by poller and scenario unit tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::error_handling::{RoundTripError, TransportError, TransportErrorKind};
use crate::fetch::RoundTripper;
use crate::models::{GatewayAddress, ObservedResponse, RedirectTarget, RequestDescriptor};

/// Answers each round trip by calling `respond` with the attempt number (from 0).
pub(crate) struct FnRoundTripper<F> {
    respond: F,
    latency: Duration,
    calls: AtomicU32,
}

impl<F> FnRoundTripper<F>
where
    F: Fn(&RequestDescriptor, u32) -> Result<ObservedResponse, RoundTripError> + Send + Sync,
{
    pub(crate) fn new(respond: F) -> Self {
        Self {
            respond,
            latency: Duration::ZERO,
            calls: AtomicU32::new(0),
        }
    }

    /// Delays every answer, simulated against the tokio clock.
    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<F> RoundTripper for FnRoundTripper<F>
where
    F: Fn(&RequestDescriptor, u32) -> Result<ObservedResponse, RoundTripError> + Send + Sync,
{
    async fn round_trip(
        &self,
        _gateway: &GatewayAddress,
        request: &RequestDescriptor,
    ) -> Result<ObservedResponse, RoundTripError> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        (self.respond)(request, attempt)
    }
}

pub(crate) fn gateway() -> GatewayAddress {
    GatewayAddress::parse("gateway.test:80").expect("valid test address")
}

pub(crate) fn https_redirect(status_code: u16, host: &str, path: &str) -> ObservedResponse {
    ObservedResponse::new(status_code)
        .with_header("location", format!("https://{}{}", host, path))
        .with_redirect(RedirectTarget::new().scheme("https").host(host).path(path))
}

pub(crate) fn not_found() -> ObservedResponse {
    ObservedResponse::new(404)
}

pub(crate) fn refused() -> RoundTripError {
    TransportError::new(TransportErrorKind::Connect, "connection refused").into()
}
