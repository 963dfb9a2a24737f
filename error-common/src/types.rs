use crate::codes::ErrorKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// The core's typed error. Carries everything §6.5's envelope needs plus an
/// internal `error_id` used only in server-side logs.
#[derive(Error, Debug, Serialize, Deserialize)]
pub struct KuuraError {
    pub kind: ErrorKind,
    pub message: String,
    pub metadata: Option<Value>,
    pub trace_id: Option<String>,
    pub error_id: Uuid,
    #[serde(skip)]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl KuuraError {
    pub fn new(kind: ErrorKind) -> ErrorBuilder {
        ErrorBuilder::new(kind)
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }

    /// §7: authentication failures are logged in full server-side but
    /// reported to the client as a generic `Unauthorized` without
    /// disclosing whether the session/user existed.
    pub fn client_envelope(&self) -> ErrorEnvelope {
        let message = if matches!(self.kind, ErrorKind::Unauthorized) {
            self.kind.description().to_string()
        } else {
            self.message.clone()
        };
        ErrorEnvelope {
            message,
            code: self.code().to_string(),
            trace_id: self.trace_id.clone().unwrap_or_default(),
            metadata: self.metadata.clone(),
        }
    }
}

impl fmt::Display for KuuraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} (id: {})", self.code(), self.message, self.error_id)
    }
}

/// The wire shape of §6.5's error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub message: String,
    pub code: String,
    pub trace_id: String,
    pub metadata: Option<Value>,
}

pub struct ErrorBuilder {
    kind: ErrorKind,
    message: Option<String>,
    metadata: Option<Value>,
    trace_id: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ErrorBuilder {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            metadata: None,
            trace_id: None,
            source: None,
        }
    }

    pub fn with_message<S: Into<String>>(mut self, message: S) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Convenience for validation errors: attaches `metadata.problems`.
    pub fn with_problems(mut self, problems: std::collections::HashMap<String, String>) -> Self {
        self.metadata = Some(serde_json::json!({ "problems": problems }));
        self
    }

    pub fn with_trace_id<S: Into<String>>(mut self, trace_id: S) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn build(self) -> KuuraError {
        KuuraError {
            message: self.message.unwrap_or_else(|| self.kind.description().to_string()),
            kind: self.kind,
            metadata: self.metadata,
            trace_id: self.trace_id,
            error_id: Uuid::new_v4(),
            source: self.source,
        }
    }
}

pub type KuuraResult<T> = Result<T, KuuraError>;
