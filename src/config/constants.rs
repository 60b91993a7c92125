//! Configuration constants.
//!
//! Defaults for the consistency poller, the round-trip executor and the scenario
//! runner. The timing values can be overridden per scenario through `TimeoutConfig`
//! or the CLI.

use std::time::Duration;

/// Time between two polling attempts for the same case.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Overall budget for a case to reach a settled state.
///
/// Routing changes usually propagate within a few seconds, but data-plane
/// replicas on a loaded cluster can lag well behind the control plane.
pub const DEFAULT_MAX_TIME_TO_CONSISTENCY: Duration = Duration::from_secs(30);

/// Number of back-to-back matching observations before a case is considered settled.
pub const DEFAULT_REQUIRED_CONSECUTIVE_SUCCESSES: u32 = 3;

/// Per-attempt timeout for a single HTTP exchange (including followed redirects).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// TCP connect timeout, capped by the per-attempt timeout.
pub const TCP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum redirect hops followed when a request asks for redirects to be followed.
pub const DEFAULT_MAX_REDIRECT_HOPS: usize = 10;

/// Maximum number of cases polled at the same time within one scenario.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// User-Agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("gateway_conformance/", env!("CARGO_PKG_VERSION"));

/// Status codes whose `Location` is followed for requests that follow redirects.
///
/// Every other 3xx with a `Location` is captured as the final response.
pub const FOLLOWED_REDIRECT_STATUS_CODES: [u16; 5] = [301, 302, 303, 307, 308];
