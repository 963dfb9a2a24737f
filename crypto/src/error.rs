use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("key must be {expected} bytes, got {got}")]
    KeyLength { expected: usize, got: usize },

    #[error("nonce must be {expected} bytes, got {got}")]
    NonceLength { expected: usize, got: usize },

    #[error("authentication failed")]
    AuthFailure,

    #[error("key generation failed: {0}")]
    KeyGenerationFailed(String),

    #[error("invalid key")]
    InvalidKey,

    #[error("hash is from an incompatible version: {0}")]
    IncompatibleVersion(String),

    #[error("malformed encoded hash: {0}")]
    InvalidFormat(String),

    #[error("invalid UTF-8 in decrypted data")]
    InvalidUtf8,

    #[error("key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
