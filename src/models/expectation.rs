//! Response expectations and redirect targets.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error_handling::ConfigurationError;

/// Components of a redirect `Location`.
///
/// A `None` field is "not asserted" on an expectation and "not present in the
/// header" on an observation. It is never the same thing as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RedirectTarget {
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub path: Option<String>,
}

impl RedirectTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unset = "*";
        write!(
            f,
            "{}://{}:{}{}",
            self.scheme.as_deref().unwrap_or(unset),
            self.host.as_deref().unwrap_or(unset),
            self.port.as_deref().unwrap_or(unset),
            self.path.as_deref().unwrap_or("/*"),
        )
    }
}

/// How an expected header value is compared with the observed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "match", content = "value", rename_all = "snake_case")]
pub enum HeaderMatch {
    Exact(String),
    Prefix(String),
}

impl HeaderMatch {
    pub fn matches(&self, observed: &str) -> bool {
        match self {
            HeaderMatch::Exact(expected) => observed == expected,
            HeaderMatch::Prefix(prefix) => observed.starts_with(prefix.as_str()),
        }
    }
}

impl fmt::Display for HeaderMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderMatch::Exact(v) => write!(f, "{:?}", v),
            HeaderMatch::Prefix(v) => write!(f, "{:?}*", v),
        }
    }
}

/// What a case expects the gateway to answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseExpectation {
    status_code: u16,
    headers: BTreeMap<String, HeaderMatch>,
    absent_headers: Vec<String>,
    redirect_target: Option<RedirectTarget>,
}

impl ResponseExpectation {
    pub fn status(status_code: u16) -> Self {
        Self {
            status_code,
            headers: BTreeMap::new(),
            absent_headers: Vec::new(),
            redirect_target: None,
        }
    }

    /// Expects `name` to be present with exactly `value`. Names are case-insensitive.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(
            name.as_ref().to_ascii_lowercase(),
            HeaderMatch::Exact(value.into()),
        );
        self
    }

    /// Expects `name` to be present with a value starting with `prefix`.
    pub fn with_header_prefix(mut self, name: impl AsRef<str>, prefix: impl Into<String>) -> Self {
        self.headers.insert(
            name.as_ref().to_ascii_lowercase(),
            HeaderMatch::Prefix(prefix.into()),
        );
        self
    }

    /// Expects `name` to be missing from the response.
    pub fn without_header(mut self, name: impl AsRef<str>) -> Self {
        self.absent_headers.push(name.as_ref().to_ascii_lowercase());
        self
    }

    pub fn with_redirect(mut self, target: RedirectTarget) -> Self {
        self.redirect_target = Some(target);
        self
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Expected headers keyed by lowercase name.
    pub fn headers(&self) -> &BTreeMap<String, HeaderMatch> {
        &self.headers
    }

    pub fn absent_headers(&self) -> &[String] {
        &self.absent_headers
    }

    pub fn redirect_target(&self) -> Option<&RedirectTarget> {
        self.redirect_target.as_ref()
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigurationError> {
        if !(100..=599).contains(&self.status_code) {
            return Err(ConfigurationError::InvalidStatusCode(self.status_code));
        }
        if self.redirect_target.is_some() && !is_redirect_status(self.status_code) {
            return Err(ConfigurationError::RedirectOnNonRedirectStatus(
                self.status_code,
            ));
        }
        Ok(())
    }
}

/// Any 3xx. A redirect target may be expected on, and is parsed from, all of them.
pub(crate) fn is_redirect_status(status_code: u16) -> bool {
    (300..=399).contains(&status_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_target_builder_leaves_unset_fields_none() {
        let target = RedirectTarget::new().scheme("https");
        assert_eq!(target.scheme.as_deref(), Some("https"));
        assert!(target.host.is_none());
        assert!(target.port.is_none());
        assert!(target.path.is_none());
    }

    #[test]
    fn test_redirect_target_display_marks_unset() {
        let target = RedirectTarget::new().scheme("https").host("example.org");
        assert_eq!(target.to_string(), "https://example.org:*/*");
    }

    #[test]
    fn test_header_match() {
        assert!(HeaderMatch::Exact("a".into()).matches("a"));
        assert!(!HeaderMatch::Exact("a".into()).matches("ab"));
        assert!(HeaderMatch::Prefix("max-age".into()).matches("max-age=60"));
        assert!(!HeaderMatch::Prefix("max-age".into()).matches("no-store"));
    }

    #[test]
    fn test_header_names_are_lowercased() {
        let exp = ResponseExpectation::status(200)
            .with_header("X-Backend", "infra-backend-v1")
            .without_header("X-Internal");
        assert!(exp.headers().contains_key("x-backend"));
        assert_eq!(exp.absent_headers(), ["x-internal".to_string()]);
    }

    #[test]
    fn test_validate_redirect_requires_3xx() {
        let exp = ResponseExpectation::status(200).with_redirect(RedirectTarget::new());
        assert_eq!(
            exp.validate().unwrap_err(),
            ConfigurationError::RedirectOnNonRedirectStatus(200)
        );
        for status in [300, 301, 302, 303, 304, 305, 306, 307, 308, 399] {
            let exp = ResponseExpectation::status(status)
                .with_redirect(RedirectTarget::new().scheme("https"));
            assert!(exp.validate().is_ok(), "{} should accept a redirect", status);
        }
        for status in [299, 400] {
            let exp = ResponseExpectation::status(status).with_redirect(RedirectTarget::new());
            assert_eq!(
                exp.validate().unwrap_err(),
                ConfigurationError::RedirectOnNonRedirectStatus(status)
            );
        }
    }

    #[test]
    fn test_validate_status_range() {
        assert_eq!(
            ResponseExpectation::status(99).validate().unwrap_err(),
            ConfigurationError::InvalidStatusCode(99)
        );
        assert!(ResponseExpectation::status(404).validate().is_ok());
    }
}
