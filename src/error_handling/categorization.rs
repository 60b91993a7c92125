//! Transport error categorization.

use std::error::Error as StdError;

use super::types::TransportErrorKind;

/// Categorizes a `reqwest::Error` into a `TransportErrorKind`.
///
/// reqwest does not flag TLS failures separately, so they are recognised from the
/// error chain after the structured checks have been exhausted.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> TransportErrorKind {
    if error.is_builder() {
        return TransportErrorKind::Builder;
    }
    if error.is_timeout() {
        return TransportErrorKind::Timeout;
    }
    if error.is_redirect() {
        return TransportErrorKind::TooManyRedirects;
    }
    if chain_mentions_tls(error) {
        return TransportErrorKind::Tls;
    }
    if error.is_connect() {
        TransportErrorKind::Connect
    } else if error.is_body() || error.is_decode() {
        TransportErrorKind::Body
    } else {
        TransportErrorKind::Request
    }
}

fn chain_mentions_tls(error: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(cause) = current {
        let msg = cause.to_string().to_lowercase();
        if msg.contains("certificate") || msg.contains("tls") || msg.contains("handshake") {
            return true;
        }
        current = cause.source();
    }
    false
}

/// Flattens an error and its sources into one line (`outer: inner: root`).
///
/// reqwest's `Display` only shows the outermost layer, which hides the actual
/// cause ("connection refused", "dns error") from failure reports.
pub fn describe_error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![error.to_string()];
    let mut current = error.source();
    while let Some(cause) = current {
        let msg = cause.to_string();
        if parts.last() != Some(&msg) {
            parts.push(msg);
        }
        current = cause.source();
    }
    parts.join(": ")
}
