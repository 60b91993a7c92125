//! Request descriptors.

use std::collections::BTreeMap;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use serde::Serialize;

use crate::error_handling::ConfigurationError;

/// Immutable description of the request a case sends to the gateway.
///
/// Built with the chained `with_*` methods; validated when it is placed into a
/// [`TestCase`](crate::models::TestCase).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestDescriptor {
    path: String,
    method: String,
    host: Option<String>,
    headers: BTreeMap<String, String>,
    follow_redirects: bool,
}

impl RequestDescriptor {
    /// A `GET` request for `path` that follows redirects.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: Method::GET.to_string(),
            host: None,
            headers: BTreeMap::new(),
            follow_redirects: true,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Sends `host` as the `Host` header instead of the gateway address.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Captures a 3xx response instead of following its `Location`.
    pub fn unfollow_redirect(mut self) -> Self {
        self.follow_redirects = false;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn follow_redirects(&self) -> bool {
        self.follow_redirects
    }

    /// Parsed method, `None` if it is not a valid HTTP token.
    pub(crate) fn http_method(&self) -> Option<Method> {
        Method::from_bytes(self.method.as_bytes()).ok()
    }

    /// Checks everything that would otherwise fail when the request is built.
    pub(crate) fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.path.starts_with('/') {
            return Err(ConfigurationError::InvalidPath(self.path.clone()));
        }
        if Method::from_bytes(self.method.as_bytes()).is_err() {
            return Err(ConfigurationError::InvalidMethod(self.method.clone()));
        }
        if let Some(host) = &self.host {
            if host.is_empty() || HeaderValue::from_str(host).is_err() {
                return Err(ConfigurationError::InvalidHeader(format!("host: {}", host)));
            }
        }
        for (name, value) in &self.headers {
            if HeaderName::from_bytes(name.as_bytes()).is_err()
                || HeaderValue::from_str(value).is_err()
            {
                return Err(ConfigurationError::InvalidHeader(name.clone()));
            }
        }
        Ok(())
    }
}
