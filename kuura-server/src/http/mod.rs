//! HTTP surface (component K): two independently routed listeners sharing
//! one [`AppState`]. Handlers validate input, call straight into the core
//! engines, and translate the result through [`crate::error::ApiError`].

mod extract;
mod health;
mod m2m;
mod services;
mod srp;
mod trace;
mod users;

use crate::state::AppState;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub fn main_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/service/:service_id/jwks.json", get(services::public_jwks))
        .route("/v1/service/:service_id", get(services::service_info))
        .route("/v1/srp/vars", get(srp::vars))
        .route("/v1/srp/begin", post(srp::begin))
        .route("/v1/srp/verify", post(srp::verify))
        .route("/v1/user/tokens/internal", post(users::refresh_internal))
        .route("/v1/user/tokens/external", post(users::exchange_external))
        .route("/v1/logout", post(users::logout))
        .route("/v1/me", get(users::me))
        .route("/v1/m2m/access", post(m2m::refresh_access))
        .route("/", get(health::frontend_index))
        .route("/healthz", get(health::healthz))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace::assign_trace_id))
        .with_state(state)
}

pub fn management_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/m2m/sessions", post(m2m::create_session))
        .route("/v1/:service_id/jwks.json", get(services::admin_jwks))
        .route("/v1/service", post(services::create_service).get(services::list_services))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace::assign_trace_id))
        .with_state(state)
}
