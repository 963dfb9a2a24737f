//! Per-request trace ids (§10.1): a ULID generated once per inbound HTTP
//! request, carried as a `tracing` span field and reused verbatim as
//! `trace_id` in the §6.5 error envelope.

use tokio::task_local;
use tracing::Span;

task_local! {
    static TRACE_ID: String;
}

/// Builds the `tracing::info_span!` an HTTP middleware layer should enter
/// for the lifetime of one request.
pub fn trace_id_span(trace_id: &str) -> Span {
    tracing::info_span!("request", trace_id = %trace_id)
}

/// Runs `f` with `trace_id` available to [`current_trace_id`] for the
/// duration of the future. Middleware calls this once per request; nested
/// core operations call [`current_trace_id`] without threading the id
/// through every function signature.
pub async fn with_trace_id<F, T>(trace_id: String, f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    TRACE_ID.scope(trace_id, f).await
}

/// The trace id of the request currently executing, if any. Returns `None`
/// outside a [`with_trace_id`] scope (e.g. in a CLI subcommand, which has
/// no inbound request to tag).
pub fn current_trace_id() -> Option<String> {
    TRACE_ID.try_with(|id| id.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scoped_trace_id_is_visible_inside_and_absent_outside() {
        assert_eq!(current_trace_id(), None);
        let seen = with_trace_id("01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string(), async { current_trace_id() }).await;
        assert_eq!(seen.as_deref(), Some("01ARZ3NDEKTSV4RRFFQ69G5FAV"));
        assert_eq!(current_trace_id(), None);
    }
}
