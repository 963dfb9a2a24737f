//! `GET /healthz` and the static frontend landing page.

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../static/index.html");

pub async fn frontend_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn healthz(State(state): State<AppState>) -> StatusCode {
    if database_layer::is_healthy(&state.pool).await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
