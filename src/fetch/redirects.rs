//! `Location` header parsing.
//!
//! A redirect target arrives in one of three legal forms (RFC 7231 §7.1.2):
//! absolute (`https://host:port/path`), scheme-relative (`//host/path`) or
//! path-only (`/path`). Components the header does not carry stay unset so the
//! comparison can tell "not asserted" from "asserted empty".

use reqwest::Url;
use thiserror::Error;

use crate::models::RedirectTarget;

/// Why a `Location` value is not a usable redirect target.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location header is empty")]
    Empty,

    #[error("relative Location must start with '/'")]
    RelativeWithoutSlash,

    #[error("scheme-relative Location has no host")]
    SchemeRelativeWithoutHost,

    #[error("absolute Location with scheme '{0}' has no host")]
    MissingHost(String),

    #[error("invalid Location URI: {0}")]
    InvalidUri(#[from] url::ParseError),
}

/// A parsed `Location` value, tagged by the form it was written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationForm {
    Absolute {
        scheme: String,
        host: String,
        port: Option<String>,
        path: String,
    },
    SchemeRelative {
        host: String,
        port: Option<String>,
        path: String,
    },
    PathOnly {
        path: String,
    },
}

impl LocationForm {
    /// Parses a raw `Location` value.
    ///
    /// # Errors
    ///
    /// Returns a `LocationError` when the value is empty, a relative reference
    /// without a leading `/`, an absolute URI without a host, or not a URI at all.
    pub fn parse(raw: &str) -> Result<Self, LocationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(LocationError::Empty);
        }

        if let Some(rest) = raw.strip_prefix("//") {
            // Resolve against a throwaway base to validate and normalise
            let url = Url::parse(&format!("http://{}", rest))?;
            let host = url
                .host_str()
                .ok_or(LocationError::SchemeRelativeWithoutHost)?;
            return Ok(LocationForm::SchemeRelative {
                host: host.to_string(),
                port: explicit_port(authority_of(rest)),
                path: url.path().to_string(),
            });
        }

        if raw.starts_with('/') {
            let path = raw.split(['?', '#']).next().unwrap_or_default();
            return Ok(LocationForm::PathOnly {
                path: path.to_string(),
            });
        }

        match Url::parse(raw) {
            Ok(url) => {
                let host = url
                    .host_str()
                    .ok_or_else(|| LocationError::MissingHost(url.scheme().to_string()))?;
                let after_scheme = raw
                    .split_once("://")
                    .map(|(_, rest)| rest)
                    .unwrap_or_default();
                Ok(LocationForm::Absolute {
                    scheme: url.scheme().to_string(),
                    host: host.to_string(),
                    port: explicit_port(authority_of(after_scheme)),
                    path: url.path().to_string(),
                })
            }
            Err(url::ParseError::RelativeUrlWithoutBase) => Err(LocationError::RelativeWithoutSlash),
            Err(e) => Err(LocationError::InvalidUri(e)),
        }
    }

    /// Converts into the comparable form, leaving absent components unset.
    pub fn into_target(self) -> RedirectTarget {
        match self {
            LocationForm::Absolute {
                scheme,
                host,
                port,
                path,
            } => RedirectTarget {
                scheme: Some(scheme),
                host: Some(host),
                port,
                path: Some(path),
            },
            LocationForm::SchemeRelative { host, port, path } => RedirectTarget {
                scheme: None,
                host: Some(host),
                port,
                path: Some(path),
            },
            LocationForm::PathOnly { path } => RedirectTarget {
                path: Some(path),
                ..RedirectTarget::default()
            },
        }
    }

    /// Whether following this redirect leaves the current origin.
    pub fn changes_origin(&self) -> bool {
        !matches!(self, LocationForm::PathOnly { .. })
    }
}

/// The `host[:port]` part following `//`, without userinfo.
fn authority_of(after_slashes: &str) -> &str {
    let end = after_slashes
        .find(['/', '?', '#'])
        .unwrap_or(after_slashes.len());
    let authority = &after_slashes[..end];
    authority.rsplit_once('@').map_or(authority, |(_, host)| host)
}

/// Port written in the authority, kept even when it is the scheme default.
///
/// `Url::port()` drops default ports, which would turn an explicit `:443` into
/// "no port" and break assertions on it.
fn explicit_port(authority: &str) -> Option<String> {
    let host_end = if authority.starts_with('[') {
        authority.find(']')? + 1
    } else {
        authority.rfind(':')?
    };
    let port = authority[host_end..].strip_prefix(':')?;
    if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) {
        Some(port.to_string())
    } else {
        None
    }
}
