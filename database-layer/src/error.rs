use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("migration failed: {0}")]
    MigrationFailed(String),

    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Translates a raw `sqlx::Error` into the `auth-core` error the storage
/// ports are declared to return. Unique and foreign-key violations map to
/// [`auth_core::CoreError::InvalidArgument`] so callers can distinguish a
/// constraint violation from an opaque backend failure; everything else is
/// an [`auth_core::CoreError::Database`] (§7: transient DB errors bubble up
/// as `InternalServerError`, no automatic retry in the core).
pub fn map_sqlx_error(err: sqlx::Error) -> auth_core::CoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return auth_core::CoreError::InvalidArgument(format!("unique constraint violated: {db_err}"));
        }
        if db_err.is_foreign_key_violation() {
            return auth_core::CoreError::InvalidArgument(format!("foreign key violated: {db_err}"));
        }
    }
    auth_core::CoreError::Database(err.to_string())
}
