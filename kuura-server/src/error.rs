//! Single translation point from `auth_core::CoreError` to the HTTP error
//! envelope. No other module is allowed to build an `ErrorEnvelope` by hand.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use error_common::{ErrorBuilder, ErrorKind, KuuraError};

pub struct ApiError(KuuraError);

impl From<auth_core::CoreError> for ApiError {
    fn from(err: auth_core::CoreError) -> Self {
        let kind = err.to_error_kind();
        let mut builder = ErrorBuilder::new(kind).with_message(err.to_string());
        if let Some(trace_id) = telemetry::current_trace_id() {
            builder = builder.with_trace_id(trace_id);
        }
        ApiError(builder.build())
    }
}

impl From<KuuraError> for ApiError {
    fn from(err: KuuraError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        let mut builder = ErrorBuilder::new(ErrorKind::InvalidArgument).with_message(err.body_text());
        if let Some(trace_id) = telemetry::current_trace_id() {
            builder = builder.with_trace_id(trace_id);
        }
        ApiError(builder.build())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        tracing::error!(code = self.0.code(), error_id = %self.0.error_id, "{}", self.0.message);
        (status, Json(self.0.client_envelope())).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Validation-problem helper: builds a 400 `InvalidArgument` envelope with
/// `metadata.problems`, mirroring the request-level `Valid()` discipline
/// the HTTP layer applies to every decoded body.
pub fn validation_error(problems: std::collections::HashMap<String, String>) -> ApiError {
    let mut builder = ErrorBuilder::new(ErrorKind::InvalidArgument).with_problems(problems);
    if let Some(trace_id) = telemetry::current_trace_id() {
        builder = builder.with_trace_id(trace_id);
    }
    ApiError(builder.build())
}

pub fn missing_cookie(name: &str) -> ApiError {
    let mut builder = ErrorBuilder::new(ErrorKind::MissingCookie)
        .with_message(format!("required cookie '{name}' not found"))
        .with_metadata(serde_json::json!({ "cookie": name }));
    if let Some(trace_id) = telemetry::current_trace_id() {
        builder = builder.with_trace_id(trace_id);
    }
    ApiError(builder.build())
}
