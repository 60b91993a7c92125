//! Gateway address resolution.

use std::fmt;

use reqwest::Url;
use serde::Serialize;

use crate::config::GatewayScheme;
use crate::error_handling::ConfigurationError;

/// Resolved `host:port` of the gateway listener under test.
///
/// Provided by whatever provisioned the gateway; this crate only turns it into
/// request URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayAddress {
    scheme: GatewayScheme,
    authority: String,
}

impl GatewayAddress {
    /// Parses `host:port` (port optional) for a plain HTTP listener.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidGatewayAddress` if the value contains a
    /// scheme or path, or cannot form a valid URL authority.
    pub fn parse(authority: &str) -> Result<Self, ConfigurationError> {
        Self::with_scheme(authority, GatewayScheme::Http)
    }

    pub fn with_scheme(authority: &str, scheme: GatewayScheme) -> Result<Self, ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidGatewayAddress {
            address: authority.to_string(),
            reason: reason.to_string(),
        };

        let authority = authority.trim();
        if authority.is_empty() {
            return Err(invalid("address is empty"));
        }
        if authority.contains("://") {
            return Err(invalid("expected host:port without a scheme"));
        }
        if authority.contains(['/', '?', '#', '@']) {
            return Err(invalid("expected host:port without path, query or userinfo"));
        }

        let url = Url::parse(&format!("{}://{}/", scheme, authority))
            .map_err(|e| invalid(&e.to_string()))?;
        if url.host_str().is_none() {
            return Err(invalid("address has no host"));
        }

        Ok(Self {
            scheme,
            authority: authority.to_string(),
        })
    }

    pub fn scheme(&self) -> GatewayScheme {
        self.scheme
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Absolute URL for `path` on this gateway.
    pub fn url_for(&self, path: &str) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{}://{}{}", self.scheme, self.authority, path))
    }
}

impl fmt::Display for GatewayAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}
