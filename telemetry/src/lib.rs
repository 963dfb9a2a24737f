//! Structured logging and request-tracing for Kuura (§10.1).
//!
//! `tracing` is the sole logging facade used anywhere in this workspace —
//! the core never calls `println!`/`eprintln!`. This crate owns the one
//! process-wide call that installs the global subscriber; everything else
//! is plain `tracing` macros at the call site.

pub mod error;
pub mod trace_id;

pub use error::{TelemetryError, TelemetryResult};
pub use trace_id::{current_trace_id, trace_id_span};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for the `fmt` layer, selected by `LOG_FORMAT` (§6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact ANSI output for local development.
    Pretty,
    /// Newline-delimited JSON for production log aggregation.
    Json,
}

impl LogFormat {
    /// `pretty` under `DEBUG=true`, `json` otherwise, matching the default
    /// split the rest of the corpus uses for dev vs. prod logging.
    pub fn default_for_debug(debug: bool) -> Self {
        if debug {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Installs the global `tracing_subscriber::registry()`, built from an
/// `EnvFilter` (default directive `info,kuura=debug` when `filter_directive`
/// is empty) and an `fmt` layer in the requested [`LogFormat`].
///
/// Must be called exactly once, before either HTTP listener binds.
pub fn init(format: LogFormat, filter_directive: &str) -> TelemetryResult<()> {
    let directive = if filter_directive.is_empty() {
        "info,kuura=debug"
    } else {
        filter_directive
    };
    let env_filter =
        EnvFilter::try_new(directive).map_err(|e| TelemetryError::InvalidFilter(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true).with_ansi(true).compact())
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true).with_ansi(false))
            .try_init(),
    };

    result.map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))
}
