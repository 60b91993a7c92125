//! Observations produced by the round-trip executor.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error_handling::{MalformedRedirectError, RoundTripError, TransportError};
use crate::models::RedirectTarget;

/// Result of one completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservedResponse {
    pub status_code: u16,
    /// Response headers keyed by lowercase name; repeated headers are joined with `", "`.
    pub headers: BTreeMap<String, String>,
    /// Parsed `Location`, only for a redirect that was captured rather than followed.
    pub redirect: Option<RedirectTarget>,
    /// Redirect hops followed before this response arrived.
    pub hops: usize,
}

impl ObservedResponse {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: BTreeMap::new(),
            redirect: None,
            hops: 0,
        }
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_redirect(mut self, target: RedirectTarget) -> Self {
        self.redirect = Some(target);
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Everything one attempt can produce, as seen by the poller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "observation", rename_all = "snake_case")]
pub enum Observation {
    Response(ObservedResponse),
    TransportError(TransportError),
    MalformedRedirect(MalformedRedirectError),
}

impl Observation {
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Observation::TransportError(_))
    }
}

impl From<Result<ObservedResponse, RoundTripError>> for Observation {
    fn from(result: Result<ObservedResponse, RoundTripError>) -> Self {
        match result {
            Ok(response) => Observation::Response(response),
            Err(RoundTripError::Transport(e)) => Observation::TransportError(e),
            Err(RoundTripError::MalformedRedirect(e)) => Observation::MalformedRedirect(e),
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::Response(r) => {
                write!(f, "status {}", r.status_code)?;
                if let Some(target) = &r.redirect {
                    write!(f, " -> {}", target)?;
                }
                if r.hops > 0 {
                    write!(f, " after {} redirect(s)", r.hops)?;
                }
                Ok(())
            }
            Observation::TransportError(e) => write!(f, "{}", e),
            Observation::MalformedRedirect(e) => write!(f, "{}", e),
        }
    }
}
