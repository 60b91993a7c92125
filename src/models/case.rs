//! Test cases: one request paired with one expectation.

use serde::Serialize;

use crate::error_handling::ConfigurationError;
use crate::models::{RequestDescriptor, ResponseExpectation};

/// A named, validated (request, expectation) pair.
///
/// Cases are immutable once built. The scenario runner hands every worker its own
/// clone, so nothing about a case is shared between concurrently running checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    name: String,
    request: RequestDescriptor,
    expectation: ResponseExpectation,
}

impl TestCase {
    /// Validates the pair and derives the case name from its ordinal `index`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` for a malformed request or an expectation that
    /// cannot be satisfied (e.g. a redirect target on a non-3xx status).
    pub fn new(
        index: usize,
        request: RequestDescriptor,
        expectation: ResponseExpectation,
    ) -> Result<Self, ConfigurationError> {
        request.validate()?;
        expectation.validate()?;
        Ok(Self {
            name: derive_name(index, &request, &expectation),
            request,
            expectation,
        })
    }

    /// Replaces the derived name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn request(&self) -> &RequestDescriptor {
        &self.request
    }

    pub fn expectation(&self) -> &ResponseExpectation {
        &self.expectation
    }
}

fn derive_name(index: usize, request: &RequestDescriptor, expectation: &ResponseExpectation) -> String {
    let with_headers = if request.headers().is_empty() {
        ""
    } else {
        " with headers"
    };
    format!(
        "{} request to '{}{}'{} should receive a {}",
        index,
        request.host().unwrap_or_default(),
        request.path(),
        with_headers,
        expectation.status_code()
    )
}
