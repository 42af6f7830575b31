//! Axum router assembly.

use axum::Router;
use axum::http::header::{ACCEPT, CONTENT_TYPE, ORIGIN};
use axum::http::{HeaderName, Method};
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// `/health` is served directly; every other path goes through the
/// addressing table. Includes a permissive [`CorsLayer`] (which also answers
/// preflight `OPTIONS` requests) and a [`TraceLayer`] that logs each HTTP
/// request/response at the `DEBUG` level.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .fallback(crate::api::dispatch)
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers([
            ORIGIN,
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static("x-requested-with"),
        ])
}

async fn health_check() -> &'static str {
    "OK"
}
