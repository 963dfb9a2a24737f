//! Per-request trace id middleware. Generates a ULID once per inbound
//! request and scopes it via [`telemetry::with_trace_id`] so any handler
//! or core error built deeper in the call stack can read it back through
//! [`telemetry::current_trace_id`] without threading it through every
//! function signature.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

pub async fn assign_trace_id(req: Request, next: Next) -> Response {
    let trace_id = ulid::Ulid::new().to_string();
    telemetry::with_trace_id(trace_id, next.run(req)).await
}
