//! Consistency poller.
//!
//! Decides, within a bounded time budget, whether the gateway has reached and
//! *stays in* the expected state. A single match right after a routing change
//! is not enough: propagation can be partial across data-plane replicas, so the
//! poller requires a run of consecutive matches. Any mismatch, transport error
//! or malformed redirect resets that run.

mod compare;

use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;
use tokio_retry::strategy::FixedInterval;
use tokio_util::sync::CancellationToken;

use crate::config::TimeoutConfig;
use crate::error_handling::{
    ConsistencyTimeoutError, FailureSignature, TransportError, TransportErrorKind,
};
use crate::fetch::RoundTripper;
use crate::models::{GatewayAddress, Observation, TestCase};

pub use compare::{compare_observation, compare_redirect, compare_response, Mismatch, RedirectField};

/// A case reached the consecutive-match threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settled {
    /// Attempts made, including the matching run
    pub attempts: u32,
    /// Time from the first attempt to the final match
    pub elapsed: Duration,
}

/// Why a case stopped without settling.
#[derive(Error, Debug, Clone)]
pub enum PollError {
    #[error(transparent)]
    Timeout(#[from] Box<ConsistencyTimeoutError>),

    #[error("cancelled after {attempts} attempts ({elapsed:?})")]
    Cancelled { attempts: u32, elapsed: Duration },
}

/// Running state of one case's observations.
#[derive(Debug, Default)]
struct StreakTracker {
    attempts: u32,
    transport_errors: u32,
    consecutive: u32,
    max_consecutive: u32,
    regressions: u32,
    last_observed: Option<Observation>,
    last_mismatch: Option<Mismatch>,
}

impl StreakTracker {
    fn record(&mut self, observation: Observation, verdict: Result<(), Mismatch>) -> u32 {
        self.attempts += 1;
        if observation.is_transport_error() {
            self.transport_errors += 1;
        }
        match verdict {
            Ok(()) => {
                self.consecutive += 1;
                self.max_consecutive = self.max_consecutive.max(self.consecutive);
            }
            Err(mismatch) => {
                if self.consecutive > 0 {
                    self.regressions += 1;
                }
                self.consecutive = 0;
                self.last_mismatch = Some(mismatch);
            }
        }
        self.last_observed = Some(observation);
        self.consecutive
    }

    fn signature(&self) -> FailureSignature {
        if self.regressions > 0 {
            FailureSignature::MatchedThenRegressed
        } else if self.max_consecutive > 0 {
            FailureSignature::StillSettling
        } else {
            FailureSignature::NeverMatched
        }
    }

    fn into_timeout(self, case: &TestCase, elapsed: Duration) -> ConsistencyTimeoutError {
        let signature = self.signature();
        ConsistencyTimeoutError {
            case: case.name().to_string(),
            expected: case.expectation().clone(),
            // At least one attempt always precedes a timeout
            last_observed: self.last_observed.unwrap_or_else(|| {
                Observation::TransportError(TransportError::new(
                    TransportErrorKind::AttemptTimeout,
                    "no attempt completed",
                ))
            }),
            last_mismatch: self.last_mismatch,
            attempt_count: self.attempts,
            transport_errors: self.transport_errors,
            max_consecutive_matches: self.max_consecutive,
            elapsed,
            signature,
        }
    }
}

/// Runs one attempt, bounded by the per-attempt timeout.
async fn attempt<R: RoundTripper + ?Sized>(
    round_tripper: &R,
    timeouts: &TimeoutConfig,
    gateway: &GatewayAddress,
    case: &TestCase,
) -> Observation {
    match tokio::time::timeout(
        timeouts.request_timeout,
        round_tripper.round_trip(gateway, case.request()),
    )
    .await
    {
        Ok(result) => result.into(),
        Err(_) => Observation::TransportError(TransportError::new(
            TransportErrorKind::AttemptTimeout,
            format!("no response within {:?}", timeouts.request_timeout),
        )),
    }
}

/// Polls `case` until it matches `required_consecutive_successes` times in a row.
///
/// Returns as soon as the threshold is reached. Fails with a
/// `ConsistencyTimeoutError` once `max_time_to_consistency` has elapsed, never
/// earlier, carrying the most recent observation. Cancellation is checked before
/// every attempt and during every interval wait.
///
/// `timeouts` is assumed valid; see [`TimeoutConfig::validate`].
///
/// # Errors
///
/// - `PollError::Timeout` if the case did not settle within the budget
/// - `PollError::Cancelled` if `cancel` fired first
pub async fn expect_eventually_consistent<R: RoundTripper + ?Sized>(
    round_tripper: &R,
    timeouts: &TimeoutConfig,
    gateway: &GatewayAddress,
    case: &TestCase,
    cancel: &CancellationToken,
) -> Result<Settled, PollError> {
    let start = Instant::now();
    let required = timeouts.required_consecutive_successes.max(1);
    let mut delays = FixedInterval::new(timeouts.poll_interval);
    let mut tracker = StreakTracker::default();

    loop {
        let observation = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(PollError::Cancelled {
                    attempts: tracker.attempts,
                    elapsed: start.elapsed(),
                });
            }
            observation = attempt(round_tripper, timeouts, gateway, case) => observation,
        };

        let verdict = compare_observation(case.expectation(), &observation);
        match &verdict {
            Ok(()) => debug!(
                "{}: attempt {} matched ({} in a row)",
                case.name(),
                tracker.attempts + 1,
                tracker.consecutive + 1
            ),
            Err(mismatch) => {
                if tracker.consecutive > 0 {
                    debug!(
                        "{}: regressed after {} consecutive matches: {}",
                        case.name(),
                        tracker.consecutive,
                        mismatch
                    );
                } else {
                    debug!(
                        "{}: attempt {} did not match: {}",
                        case.name(),
                        tracker.attempts + 1,
                        mismatch
                    );
                }
            }
        }

        if tracker.record(observation, verdict) >= required {
            let settled = Settled {
                attempts: tracker.attempts,
                elapsed: start.elapsed(),
            };
            info!(
                "{}: consistent after {} attempts in {:?}",
                case.name(),
                settled.attempts,
                settled.elapsed
            );
            return Ok(settled);
        }

        let elapsed = start.elapsed();
        if elapsed >= timeouts.max_time_to_consistency {
            let error = tracker.into_timeout(case, elapsed);
            warn!("{}", error);
            return Err(PollError::Timeout(Box::new(error)));
        }

        let delay = delays.next().unwrap_or(timeouts.poll_interval);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(PollError::Cancelled {
                    attempts: tracker.attempts,
                    elapsed: start.elapsed(),
                });
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
