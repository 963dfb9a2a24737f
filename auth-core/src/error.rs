//! The core's typed error, distinct from the HTTP-facing [`error_common::KuuraError`]
//! envelope. `kuura-server` maps each variant to an [`error_common::ErrorKind`]
//! when it translates a `CoreError` into a response.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("user not found")]
    UserNotFound,

    #[error("a login is already in progress for this user")]
    AlreadyLoggingIn,

    #[error("invalid service id")]
    InvalidServiceId,

    #[error("service not found")]
    ServiceNotFound,

    #[error("setting not found")]
    SettingNotFound,

    #[error("cannot remove the current signing key")]
    InvalidOp,

    #[error(transparent)]
    Crypto(#[from] crypto::CryptoError),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn to_error_kind(&self) -> error_common::ErrorKind {
        match self {
            CoreError::Internal(_) | CoreError::Database(_) | CoreError::Crypto(_) => {
                error_common::ErrorKind::InternalServerError
            }
            CoreError::InvalidArgument(_) | CoreError::InvalidOp => error_common::ErrorKind::InvalidArgument,
            CoreError::Unauthorized => error_common::ErrorKind::Unauthorized,
            CoreError::UserNotFound => error_common::ErrorKind::UserNotFound,
            CoreError::AlreadyLoggingIn => error_common::ErrorKind::AlreadyLoggingIn,
            CoreError::InvalidServiceId => error_common::ErrorKind::InvalidServiceId,
            CoreError::ServiceNotFound => error_common::ErrorKind::ServiceNotFound,
            CoreError::SettingNotFound => error_common::ErrorKind::SettingNotFound,
        }
    }
}
