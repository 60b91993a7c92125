//! Built-in conformance scenarios.
//!
//! Each function returns a fresh `Scenario` value; nothing is registered globally.
//! The routes they exercise must already be attached to the gateway under test.

use crate::error_handling::ConfigurationError;
use crate::models::{RedirectTarget, RequestDescriptor, ResponseExpectation};
use crate::scenario::Scenario;

/// An HTTPRoute with a scheme redirect filter.
///
/// Every case captures the redirect instead of following it:
///
/// | path                          | status | redirect to                 |
/// |-------------------------------|--------|-----------------------------|
/// | `/scheme`                     | 302    | `https://<any host>`        |
/// | `/scheme-and-host`            | 302    | `https://example.org`       |
/// | `/scheme-and-status`          | 301    | `https://<any host>`        |
/// | `/scheme-and-host-and-status` | 302    | `https://example.org`       |
///
/// # Errors
///
/// Only fails if a case definition is invalid, which would be a defect here.
pub fn http_route_redirect_scheme() -> Result<Scenario, ConfigurationError> {
    let https = || RedirectTarget::new().scheme("https");

    Scenario::new(
        "HTTPRouteRedirectScheme",
        "An HTTPRoute with a scheme redirect filter",
    )
    .with_case(
        RequestDescriptor::get("/scheme").unfollow_redirect(),
        ResponseExpectation::status(302).with_redirect(https()),
    )?
    .with_case(
        RequestDescriptor::get("/scheme-and-host").unfollow_redirect(),
        ResponseExpectation::status(302).with_redirect(https().host("example.org")),
    )?
    .with_case(
        RequestDescriptor::get("/scheme-and-status").unfollow_redirect(),
        ResponseExpectation::status(301).with_redirect(https()),
    )?
    .with_case(
        RequestDescriptor::get("/scheme-and-host-and-status").unfollow_redirect(),
        ResponseExpectation::status(302).with_redirect(https().host("example.org")),
    )
}

/// All built-in scenarios, in the order they run.
///
/// # Errors
///
/// See [`http_route_redirect_scheme`].
pub fn builtin_scenarios() -> Result<Vec<Scenario>, ConfigurationError> {
    Ok(vec![http_route_redirect_scheme()?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_scheme_cases() {
        let scenario = http_route_redirect_scheme().unwrap();
        assert_eq!(scenario.short_name(), "HTTPRouteRedirectScheme");

        let names: Vec<&str> = scenario.cases().iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "0 request to '/scheme' should receive a 302",
                "1 request to '/scheme-and-host' should receive a 302",
                "2 request to '/scheme-and-status' should receive a 301",
                "3 request to '/scheme-and-host-and-status' should receive a 302",
            ]
        );

        for case in scenario.cases() {
            assert!(!case.request().follow_redirects());
            let target = case.expectation().redirect_target().unwrap();
            assert_eq!(target.scheme.as_deref(), Some("https"));
            assert!(target.port.is_none());
            assert!(target.path.is_none());
        }
    }

    #[test]
    fn test_host_only_asserted_where_rewritten() {
        let scenario = http_route_redirect_scheme().unwrap();
        let hosts: Vec<Option<&str>> = scenario
            .cases()
            .iter()
            .map(|c| c.expectation().redirect_target().unwrap().host.as_deref())
            .collect();
        assert_eq!(hosts, vec![None, Some("example.org"), None, Some("example.org")]);
    }

    #[test]
    fn test_builtin_scenarios() {
        let scenarios = builtin_scenarios().unwrap();
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].cases().len(), 4);
    }
}
