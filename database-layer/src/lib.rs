//! PostgreSQL adapter for the `auth-core` storage ports (§5, §9). Each
//! `Pg*Store` wraps a shared `sqlx::PgPool` and implements exactly one
//! storage trait; `kuura-server` constructs the pool once and hands clones
//! to every store.

pub mod error;
pub mod key_store;
pub mod m2m_store;
pub mod pool;
pub mod service_store;
pub mod user_store;

pub use error::{map_sqlx_error, DatabaseError, DatabaseResult};
pub use key_store::PgKeyStore;
pub use m2m_store::PgM2MStore;
pub use pool::{connect, is_healthy, PoolSettings};
pub use service_store::PgServiceStore;
pub use user_store::PgUserStore;
