//! HTTP request building and header extraction.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use reqwest::header::HeaderMap;
use reqwest::{Method, Url};

use crate::models::RequestDescriptor;

/// Builds one hop of a round trip.
///
/// `host_override` is sent as the `Host` header; it is only carried across hops
/// that stay on the same origin.
pub(crate) fn build_request(
    client: &reqwest::Client,
    method: Method,
    url: Url,
    descriptor: &RequestDescriptor,
    host_override: Option<&str>,
) -> reqwest::RequestBuilder {
    let mut builder = client.request(method, url);
    for (name, value) in descriptor.headers() {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(host) = host_override {
        builder = builder.header(reqwest::header::HOST, host);
    }
    builder
}

/// Flattens response headers into lowercase names, joining repeated values.
pub(crate) fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        match collected.entry(name.as_str().to_string()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.push_str(", ");
                existing.push_str(&value);
            }
            Entry::Vacant(entry) => {
                entry.insert(value.into_owned());
            }
        }
    }
    collected
}

/// Method for the next hop, following browser semantics for 301/302/303.
pub(crate) fn redirect_method(status_code: u16, method: &Method) -> Method {
    match status_code {
        303 if *method != Method::HEAD => Method::GET,
        301 | 302 if *method == Method::POST => Method::GET,
        _ => method.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderName, HeaderValue};

    fn add_header(headers: &mut HeaderMap, name: &str, value: &str) {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .unwrap_or_else(|_| panic!("Invalid header name in test: {}", name));
        let header_value = HeaderValue::from_str(value)
            .unwrap_or_else(|_| panic!("Invalid header value in test: {}", value));
        headers.append(header_name, header_value);
    }

    #[test]
    fn test_collect_headers_lowercases_names() {
        let mut headers = HeaderMap::new();
        add_header(&mut headers, "Location", "https://example.org/");
        add_header(&mut headers, "X-Backend", "v1");

        let collected = collect_headers(&headers);
        assert_eq!(collected.len(), 2);
        assert_eq!(collected.get("location").map(String::as_str), Some("https://example.org/"));
        assert_eq!(collected.get("x-backend").map(String::as_str), Some("v1"));
    }

    #[test]
    fn test_collect_headers_joins_repeated_values() {
        let mut headers = HeaderMap::new();
        add_header(&mut headers, "Set-Cookie", "a=1");
        add_header(&mut headers, "Set-Cookie", "b=2");

        let collected = collect_headers(&headers);
        assert_eq!(collected.get("set-cookie").map(String::as_str), Some("a=1, b=2"));
    }

    #[test]
    fn test_collect_headers_empty() {
        assert!(collect_headers(&HeaderMap::new()).is_empty());
    }

    #[test]
    fn test_redirect_method() {
        assert_eq!(redirect_method(303, &Method::POST), Method::GET);
        assert_eq!(redirect_method(303, &Method::HEAD), Method::HEAD);
        assert_eq!(redirect_method(302, &Method::POST), Method::GET);
        assert_eq!(redirect_method(302, &Method::PUT), Method::PUT);
        assert_eq!(redirect_method(307, &Method::POST), Method::POST);
        assert_eq!(redirect_method(308, &Method::GET), Method::GET);
    }

    #[test]
    fn test_build_request_sets_host_and_headers() {
        let client = reqwest::Client::new();
        let descriptor = RequestDescriptor::get("/").with_header("x-echo", "1");
        let url = Url::parse("http://127.0.0.1:8080/").unwrap();
        let request = build_request(&client, Method::GET, url, &descriptor, Some("example.org"))
            .build()
            .unwrap();
        assert_eq!(request.headers()["host"], "example.org");
        assert_eq!(request.headers()["x-echo"], "1");
    }
}
