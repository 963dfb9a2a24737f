//! Common error types shared by Kuura's crates.
//!
//! Every fallible operation in `auth-core` and `kuura-server` returns a
//! [`KuuraError`] built around the closed `Knnnn` taxonomy in [`codes`].
//! The HTTP layer turns one into the `{message, code, trace_id, metadata}`
//! envelope from `KuuraError::client_envelope`.

pub mod codes;
pub mod context;
pub mod types;

pub use codes::*;
pub use context::*;
pub use types::*;
