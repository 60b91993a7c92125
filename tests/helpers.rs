// Mock gateway for integration tests.
//
// Serves the HTTPRouteRedirectScheme routes the way a conformant data plane
// would once the route has propagated, with knobs for delayed propagation,
// flapping replicas and a misconfigured scheme.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;

use gateway_conformance::TimeoutConfig;

/// How the mock data plane answers.
#[derive(Debug, Clone, Copy)]
#[allow(dead_code)] // Not every test file uses every behavior
pub enum Propagation {
    /// Routes are live from the first request.
    Ready,
    /// The first `n` requests (across all paths) get a 404.
    After(usize),
    /// Every third request hits a replica without the route.
    Flapping,
    /// Routes redirect to `http` instead of `https`.
    WrongScheme,
}

struct GatewayState {
    propagation: Propagation,
    requests: AtomicUsize,
}

/// Starts the mock gateway on an ephemeral port and returns `host:port`.
pub async fn start_gateway(propagation: Propagation) -> String {
    let state = Arc::new(GatewayState {
        propagation,
        requests: AtomicUsize::new(0),
    });
    let app = Router::new().fallback(route).with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock gateway");
    let addr = listener.local_addr().expect("Failed to get local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    addr.to_string()
}

/// Returns an address nothing is listening on.
#[allow(dead_code)]
pub async fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local address");
    drop(listener);
    addr.to_string()
}

/// Short timings so a failing case gives up quickly.
#[allow(dead_code)]
pub fn fast_timeouts(max_time_to_consistency: Duration) -> TimeoutConfig {
    TimeoutConfig {
        poll_interval: Duration::from_millis(50),
        max_time_to_consistency,
        required_consecutive_successes: 3,
        request_timeout: Duration::from_secs(2),
        max_redirect_hops: 5,
    }
}

async fn route(State(state): State<Arc<GatewayState>>, headers: HeaderMap, uri: Uri) -> Response {
    let seen = state.requests.fetch_add(1, Ordering::SeqCst);
    let propagated = match state.propagation {
        Propagation::Ready | Propagation::WrongScheme => true,
        Propagation::After(n) => seen >= n,
        Propagation::Flapping => seen % 3 != 2,
    };
    if !propagated {
        return StatusCode::NOT_FOUND.into_response();
    }

    let scheme = match state.propagation {
        Propagation::WrongScheme => "http",
        _ => "https",
    };
    // The redirect keeps the request hostname but drops the listener port
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.split(':').next().unwrap_or(h).to_string())
        .unwrap_or_default();

    let path = uri.path();
    let (status, location) = match path {
        "/scheme" => (StatusCode::FOUND, format!("{}://{}{}", scheme, host, path)),
        "/scheme-and-host" => (StatusCode::FOUND, format!("{}://example.org{}", scheme, path)),
        "/scheme-and-status" => (
            StatusCode::MOVED_PERMANENTLY,
            format!("{}://{}{}", scheme, host, path),
        ),
        "/scheme-and-host-and-status" => {
            (StatusCode::FOUND, format!("{}://example.org{}", scheme, path))
        }
        "/old" => (StatusCode::FOUND, "/new".to_string()),
        "/new" => return (StatusCode::OK, [("x-backend", "infra-backend-v1")]).into_response(),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    (status, [(header::LOCATION, location)]).into_response()
}
