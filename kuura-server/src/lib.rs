//! Library surface for the Kuura server binary. Split out from `main.rs`
//! so integration tests can build a real [`state::AppState`] and drive
//! [`http::main_router`]/[`http::management_router`] in-process with
//! `tower::ServiceExt::oneshot`, the same way the binary wires them for a
//! live listener in [`lifecycle::serve`].

pub mod cli;
pub mod config;
pub mod cookies;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod state;
