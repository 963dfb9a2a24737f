//! Cryptographic primitives for Kuura: the symmetric envelope that seals
//! JWK private material at rest (component A) and the Argon2id token
//! hasher used for refresh and M2M tokens (component B), plus the
//! constant-time comparisons both higher layers rely on.

pub mod aes_gcm;
pub mod constant_time;
pub mod envelope;
pub mod error;
pub mod kdf;

pub use envelope::Envelope;
pub use error::{CryptoError, CryptoResult};
pub use kdf::{TokenHasher, TokenHasherParams};
