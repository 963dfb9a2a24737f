//! The HARD CORE of Kuura: JWK lifecycle management, the session/token
//! engine, SRP-6a login, and the M2M engine. Every operation here depends
//! only on the storage ports in [`store`]; `database-layer` supplies the
//! single production SQL adapter and `kuura-server` wires the two together.

pub mod error;
pub mod jwk;
pub mod m2m;
pub mod models;
pub mod service;
pub mod srp;
pub mod store;
pub mod tokens;

pub use error::{CoreError, CoreResult};
pub use jwk::JwkManager;
pub use m2m::M2MEngine;
pub use service::ServiceRegistry;
pub use srp::SrpEngine;
pub use tokens::TokenEngine;
