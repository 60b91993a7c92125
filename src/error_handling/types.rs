//! Error type definitions.
//!
//! This module defines every error surfaced by the engine. Only
//! `ConsistencyTimeoutError` and `ConfigurationError` reach the user; transport
//! failures and malformed redirects are absorbed by the poller as non-matching
//! observations.

use std::time::Duration;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use serde::Serialize;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

use crate::models::{Observation, ResponseExpectation};
use crate::poll::Mismatch;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Invalid test-case or run construction.
///
/// Raised before any network activity: these indicate a defect in how a case was
/// authored, not in the gateway under test.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Request path is empty or does not start with `/`.
    #[error("request path '{0}' must be non-empty and start with '/'")]
    InvalidPath(String),

    /// Request method is not a valid HTTP token.
    #[error("request method '{0}' is not a valid HTTP method")]
    InvalidMethod(String),

    /// A header name or value cannot be sent on the wire.
    #[error("header '{0}' is not a valid HTTP header")]
    InvalidHeader(String),

    /// Expected status code outside 100..=599.
    #[error("expected status code {0} is not a valid HTTP status")]
    InvalidStatusCode(u16),

    /// A redirect target was expected on a status that is not a redirect.
    #[error("redirect target expected on non-redirect status code {0}")]
    RedirectOnNonRedirectStatus(u16),

    /// The gateway address cannot be used to build request URLs.
    #[error("gateway address '{address}' is invalid: {reason}")]
    InvalidGatewayAddress {
        /// Address as supplied
        address: String,
        /// Why it was rejected
        reason: String,
    },

    /// Timing configuration the poller cannot make progress with.
    #[error("invalid timeout configuration: {0}")]
    InvalidTimeoutConfig(String),
}

/// Categories of connection-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    /// TCP connection could not be established (refused, unreachable, DNS).
    Connect,
    /// The HTTP client's own timeout fired.
    Timeout,
    /// The per-attempt budget elapsed before the exchange completed.
    AttemptTimeout,
    /// TLS handshake or certificate failure.
    Tls,
    /// The request could not be built (bad URL, header).
    Builder,
    /// The redirect chain exceeded the configured hop limit.
    TooManyRedirects,
    /// The response could not be read or decoded.
    Body,
    /// Any other request failure.
    Request,
}

impl TransportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::Connect => "connect error",
            TransportErrorKind::Timeout => "request timeout",
            TransportErrorKind::AttemptTimeout => "attempt timeout",
            TransportErrorKind::Tls => "TLS error",
            TransportErrorKind::Builder => "request builder error",
            TransportErrorKind::TooManyRedirects => "too many redirects",
            TransportErrorKind::Body => "response body error",
            TransportErrorKind::Request => "request error",
        }
    }
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection-level failure of one round trip.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{kind}: {message}")]
pub struct TransportError {
    /// Category used for diagnostics
    pub kind: TransportErrorKind,
    /// Full error chain, flattened
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<ReqwestError> for TransportError {
    fn from(error: ReqwestError) -> Self {
        let kind = super::categorize_reqwest_error(&error);
        Self::new(kind, super::describe_error_chain(&error))
    }
}

/// A `Location` header that is not an absolute, scheme-relative or path-only URI.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("malformed Location header {location:?} on {status_code} response: {reason}")]
pub struct MalformedRedirectError {
    /// Status of the redirect response carrying the header
    pub status_code: u16,
    /// Raw header value (lossy if it was not valid UTF-8)
    pub location: String,
    /// Why it could not be parsed
    pub reason: String,
}

/// Failure of one round trip, as seen by the poller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoundTripError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    MalformedRedirect(#[from] MalformedRedirectError),
}

/// How a case failed to settle, used to tell flapping apart from a missing rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureSignature {
    /// No observation ever matched the expectation.
    NeverMatched,
    /// At least one matching streak was broken by a later mismatch.
    MatchedThenRegressed,
    /// Observations started matching but the threshold was not reached in time.
    StillSettling,
}

impl FailureSignature {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureSignature::NeverMatched => "never matched",
            FailureSignature::MatchedThenRegressed => "matched then regressed",
            FailureSignature::StillSettling => "still settling",
        }
    }
}

impl std::fmt::Display for FailureSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The timeout elapsed before the required consecutive matches were observed.
#[derive(Error, Debug, Clone, Serialize)]
#[error(
    "{case}: not consistent after {elapsed:?} and {attempt_count} attempts ({signature}, best streak {max_consecutive_matches}); last mismatch: {}",
    describe_mismatch(.last_mismatch)
)]
pub struct ConsistencyTimeoutError {
    /// Derived name of the failing case
    pub case: String,
    /// What the case expected
    pub expected: ResponseExpectation,
    /// Result of the most recent attempt
    pub last_observed: Observation,
    /// Most recent mismatch, if any attempt failed to match
    pub last_mismatch: Option<Mismatch>,
    /// Total attempts made
    pub attempt_count: u32,
    /// Attempts that ended in a transport error
    pub transport_errors: u32,
    /// Longest run of consecutive matches
    pub max_consecutive_matches: u32,
    /// Time from the first attempt to the verdict
    pub elapsed: Duration,
    /// Whether the case never matched or regressed after matching
    pub signature: FailureSignature,
}

fn describe_mismatch(mismatch: &Option<Mismatch>) -> String {
    match mismatch {
        Some(m) => m.to_string(),
        None => "none".to_string(),
    }
}
