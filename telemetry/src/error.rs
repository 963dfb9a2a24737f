use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("invalid tracing filter directive: {0}")]
    InvalidFilter(String),

    #[error("global subscriber already initialized: {0}")]
    AlreadyInitialized(String),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
