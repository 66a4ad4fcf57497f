//! Gatehouse Auth Web
//!
//! HTTP front end for the signed-session login layer.
//!
//! ## Pages
//!
//! - `GET /` - Home, shows the current user
//! - `GET /account` - Signed-in only; anonymous visitors detour through login
//! - `GET /sessions/new` - Sign-in form (accepts `?redirect_to=`)
//! - `POST /sessions` - Sign in
//! - `GET|POST /sessions/destroy` - Sign out
//! - `GET /users/new` - Sign-up form (accepts `?redirect_to=`)
//! - `POST /users` - Sign up
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics (when enabled)

pub mod config;
pub mod error;
pub mod extractors;
pub mod forms;
pub mod handlers;
pub mod state;
pub mod views;

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub use config::{Config, ConfigError};
pub use state::{AppState, AuthServiceImpl};

/// Build the HTTP router
pub fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    let pages = Router::new()
        .route("/", get(handlers::index))
        .route("/account", get(handlers::account))
        .route("/sessions/new", get(handlers::new_session))
        .route("/sessions", post(handlers::create_session))
        .route(
            "/sessions/destroy",
            get(handlers::destroy_session).post(handlers::destroy_session),
        )
        .route("/users/new", get(handlers::new_user))
        .route("/users", post(handlers::create_user));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .merge(pages)
        .layer(middleware)
        .merge(health_routes)
        .merge(metrics_route)
        .with_state(state)
}
