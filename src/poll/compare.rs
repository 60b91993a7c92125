//! Comparison of observations against expectations.
//!
//! Rules are evaluated in order and stop at the first mismatch: status code,
//! expected headers, absent headers, then the redirect target. A status mismatch
//! never goes on to compare the redirect target.

use serde::Serialize;
use thiserror::Error;

use crate::error_handling::{MalformedRedirectError, TransportError};
use crate::models::{HeaderMatch, Observation, ObservedResponse, RedirectTarget, ResponseExpectation};

/// Redirect component named in a mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectField {
    Scheme,
    Host,
    Port,
    Path,
}

impl RedirectField {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectField::Scheme => "scheme",
            RedirectField::Host => "host",
            RedirectField::Port => "port",
            RedirectField::Path => "path",
        }
    }
}

impl std::fmt::Display for RedirectField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First reason an observation did not satisfy an expectation.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mismatch", rename_all = "snake_case")]
pub enum Mismatch {
    #[error("expected status code {expected}, got {observed}")]
    StatusCode { expected: u16, observed: u16 },

    #[error("expected header '{name}' to be {expected}, but it was missing")]
    MissingHeader { name: String, expected: HeaderMatch },

    #[error("expected header '{name}' to be {expected}, got {observed:?}")]
    HeaderValue {
        name: String,
        expected: HeaderMatch,
        observed: String,
    },

    #[error("expected header '{name}' to be absent, got {observed:?}")]
    UnexpectedHeader { name: String, observed: String },

    #[error("expected a redirect to {expected} but none was received")]
    MissingRedirect { expected: RedirectTarget },

    #[error("expected redirect {field} {expected:?}, got {}", describe_observed(.observed))]
    RedirectField {
        field: RedirectField,
        expected: String,
        observed: Option<String>,
    },

    #[error("transport error: {0}")]
    Transport(TransportError),

    #[error("{0}")]
    MalformedRedirect(MalformedRedirectError),
}

fn describe_observed(observed: &Option<String>) -> String {
    match observed {
        Some(value) => format!("{:?}", value),
        None => "none".to_string(),
    }
}

/// Compares one observation, treating transport and redirect-parsing failures as mismatches.
pub fn compare_observation(
    expected: &ResponseExpectation,
    observation: &Observation,
) -> Result<(), Mismatch> {
    match observation {
        Observation::Response(response) => compare_response(expected, response),
        Observation::TransportError(e) => Err(Mismatch::Transport(e.clone())),
        Observation::MalformedRedirect(e) => Err(Mismatch::MalformedRedirect(e.clone())),
    }
}

/// Compares a completed response against the expectation.
pub fn compare_response(
    expected: &ResponseExpectation,
    observed: &ObservedResponse,
) -> Result<(), Mismatch> {
    if expected.status_code() != observed.status_code {
        return Err(Mismatch::StatusCode {
            expected: expected.status_code(),
            observed: observed.status_code,
        });
    }

    for (name, header_match) in expected.headers() {
        match observed.header(name) {
            None => {
                return Err(Mismatch::MissingHeader {
                    name: name.clone(),
                    expected: header_match.clone(),
                })
            }
            Some(value) if !header_match.matches(value) => {
                return Err(Mismatch::HeaderValue {
                    name: name.clone(),
                    expected: header_match.clone(),
                    observed: value.to_string(),
                })
            }
            Some(_) => {}
        }
    }

    for name in expected.absent_headers() {
        if let Some(value) = observed.header(name) {
            return Err(Mismatch::UnexpectedHeader {
                name: name.clone(),
                observed: value.to_string(),
            });
        }
    }

    match expected.redirect_target() {
        Some(target) => compare_redirect(target, observed.redirect.as_ref()),
        None => Ok(()),
    }
}

/// Compares only the fields the expectation sets.
///
/// An unset expected field passes whatever was observed, including nothing. A set
/// expected field requires the observed field to be present and equal.
pub fn compare_redirect(
    expected: &RedirectTarget,
    observed: Option<&RedirectTarget>,
) -> Result<(), Mismatch> {
    let Some(observed) = observed else {
        return Err(Mismatch::MissingRedirect {
            expected: expected.clone(),
        });
    };

    let fields = [
        (RedirectField::Scheme, &expected.scheme, &observed.scheme),
        (RedirectField::Host, &expected.host, &observed.host),
        (RedirectField::Port, &expected.port, &observed.port),
        (RedirectField::Path, &expected.path, &observed.path),
    ];
    for (field, expected_value, observed_value) in fields {
        let Some(expected_value) = expected_value else {
            continue;
        };
        if observed_value.as_ref() != Some(expected_value) {
            return Err(Mismatch::RedirectField {
                field,
                expected: expected_value.clone(),
                observed: observed_value.clone(),
            });
        }
    }
    Ok(())
}
