// Round-trip executor tests against a local httptest server.

use std::sync::Arc;

use httptest::{matchers::*, responders::*, Expectation, Server};

use super::*;
use crate::models::RedirectTarget;

fn round_tripper(max_redirect_hops: usize) -> HttpRoundTripper {
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to build test client");
    HttpRoundTripper::new(Arc::new(client), max_redirect_hops)
}

fn gateway_for(server: &Server) -> GatewayAddress {
    GatewayAddress::parse(&server.addr().to_string()).expect("Invalid server address")
}

#[tokio::test]
async fn test_captures_redirect_without_following() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/scheme")).respond_with(
            status_code(302).insert_header("Location", "https://example.org/scheme"),
        ),
    );

    let observed = round_tripper(10)
        .round_trip(
            &gateway_for(&server),
            &RequestDescriptor::get("/scheme").unfollow_redirect(),
        )
        .await
        .unwrap();

    assert_eq!(observed.status_code, 302);
    assert_eq!(observed.hops, 0);
    assert_eq!(
        observed.redirect,
        Some(
            RedirectTarget::new()
                .scheme("https")
                .host("example.org")
                .path("/scheme")
        )
    );
    assert_eq!(observed.header("location"), Some("https://example.org/scheme"));
}

#[tokio::test]
async fn test_captures_path_only_redirect() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/old"))
            .respond_with(status_code(301).insert_header("Location", "/new")),
    );

    let observed = round_tripper(10)
        .round_trip(&gateway_for(&server), &RequestDescriptor::get("/old").unfollow_redirect())
        .await
        .unwrap();

    assert_eq!(observed.status_code, 301);
    assert_eq!(observed.redirect, Some(RedirectTarget::new().path("/new")));
}

#[tokio::test]
async fn test_follows_redirect_chain_to_final_response() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/a"))
            .respond_with(status_code(302).insert_header("Location", "/b")),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/b"))
            .respond_with(status_code(200).insert_header("X-Backend", "infra-backend-v1")),
    );

    let observed = round_tripper(10)
        .round_trip(&gateway_for(&server), &RequestDescriptor::get("/a"))
        .await
        .unwrap();

    assert_eq!(observed.status_code, 200);
    assert_eq!(observed.hops, 1);
    assert!(observed.redirect.is_none());
    assert_eq!(observed.header("x-backend"), Some("infra-backend-v1"));
}

#[tokio::test]
async fn test_redirect_loop_is_bounded_by_hop_limit() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/loop"))
            .times(4)
            .respond_with(status_code(302).insert_header("Location", "/loop")),
    );

    let err = round_tripper(3)
        .round_trip(&gateway_for(&server), &RequestDescriptor::get("/loop"))
        .await
        .unwrap_err();

    match err {
        RoundTripError::Transport(e) => assert_eq!(e.kind, TransportErrorKind::TooManyRedirects),
        other => panic!("expected a transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_location_is_reported() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/bad"))
            .respond_with(status_code(302).insert_header("Location", "no-leading-slash")),
    );

    let err = round_tripper(10)
        .round_trip(&gateway_for(&server), &RequestDescriptor::get("/bad").unfollow_redirect())
        .await
        .unwrap_err();

    match err {
        RoundTripError::MalformedRedirect(e) => {
            assert_eq!(e.status_code, 302);
            assert_eq!(e.location, "no-leading-slash");
            assert_eq!(e.reason, LocationError::RelativeWithoutSlash.to_string());
        }
        other => panic!("expected a malformed redirect, got {:?}", other),
    }
}

#[tokio::test]
async fn test_redirect_status_without_location_has_no_target() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/bare")).respond_with(status_code(302)),
    );

    let observed = round_tripper(10)
        .round_trip(&gateway_for(&server), &RequestDescriptor::get("/bare").unfollow_redirect())
        .await
        .unwrap();

    assert_eq!(observed.status_code, 302);
    assert!(observed.redirect.is_none());
}

#[tokio::test]
async fn test_host_override_is_sent() {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/"),
            request::headers(contains(("host", "example.org"))),
        ])
        .respond_with(status_code(200)),
    );

    let observed = round_tripper(10)
        .round_trip(
            &gateway_for(&server),
            &RequestDescriptor::get("/").with_host("example.org"),
        )
        .await
        .unwrap();

    assert_eq!(observed.status_code, 200);
}

#[tokio::test]
async fn test_request_headers_and_method_are_sent() {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/echo"),
            request::headers(contains(("x-conformance", "redirect"))),
        ])
        .respond_with(status_code(204)),
    );

    let observed = round_tripper(10)
        .round_trip(
            &gateway_for(&server),
            &RequestDescriptor::get("/echo")
                .with_method("POST")
                .with_header("X-Conformance", "redirect"),
        )
        .await
        .unwrap();

    assert_eq!(observed.status_code, 204);
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gateway = GatewayAddress::parse(&addr.to_string()).unwrap();
    let err = round_tripper(10)
        .round_trip(&gateway, &RequestDescriptor::get("/scheme"))
        .await
        .unwrap_err();

    match err {
        RoundTripError::Transport(e) => assert_eq!(e.kind, TransportErrorKind::Connect),
        other => panic!("expected a transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_multiple_choices_location_is_captured() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/multi"))
            .times(2)
            .respond_with(status_code(300).insert_header("Location", "https://example.org/multi")),
    );
    let expected = Some(
        RedirectTarget::new()
            .scheme("https")
            .host("example.org")
            .path("/multi"),
    );

    let captured = round_tripper(10)
        .round_trip(&gateway_for(&server), &RequestDescriptor::get("/multi").unfollow_redirect())
        .await
        .unwrap();
    assert_eq!(captured.status_code, 300);
    assert_eq!(captured.redirect, expected);

    // 300 is never followed, even when the request follows redirects
    let unfollowed = round_tripper(10)
        .round_trip(&gateway_for(&server), &RequestDescriptor::get("/multi"))
        .await
        .unwrap();
    assert_eq!(unfollowed.status_code, 300);
    assert_eq!(unfollowed.hops, 0);
    assert_eq!(unfollowed.redirect, expected);
}

#[tokio::test]
async fn test_invalid_method_is_builder_error() {
    let gateway = GatewayAddress::parse("127.0.0.1:9").unwrap();

    let err = round_tripper(10)
        .round_trip(&gateway, &RequestDescriptor::get("/scheme").with_method("GE T"))
        .await
        .unwrap_err();

    match err {
        RoundTripError::Transport(e) => {
            assert_eq!(e.kind, TransportErrorKind::Builder);
            assert!(e.message.contains("GE T"));
        }
        other => panic!("expected a transport error, got {:?}", other),
    }
}
