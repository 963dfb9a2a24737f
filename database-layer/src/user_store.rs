//! Postgres adapter for [`auth_core::store::UserStore`] (component G).

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use auth_core::error::CoreResult;
use auth_core::models::{CodeExchangeRecord, SrpInFlight, User, UserSession};
use auth_core::store::UserStore;
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

type UserRow = (Uuid, String, String, String, Vec<String>, Option<chrono::DateTime<chrono::Utc>>);

fn row_to_user(row: UserRow) -> User {
    let (id, username, hashed_username, encoded_verifier, roles, last_login_at) = row;
    User {
        id,
        username,
        hashed_username,
        encoded_verifier,
        roles: roles.into_iter().collect::<HashSet<_>>(),
        last_login_at,
    }
}

type SessionRow = (
    String,
    Uuid,
    Uuid,
    Option<String>,
    chrono::DateTime<chrono::Utc>,
    chrono::DateTime<chrono::Utc>,
    Option<chrono::DateTime<chrono::Utc>>,
);

fn row_to_session(row: SessionRow) -> UserSession {
    let (id, user_id, service_id, refresh_token_hash, expires_at, created_at, last_authenticated_at) = row;
    UserSession { id, user_id, service_id, refresh_token_hash, expires_at, created_at, last_authenticated_at }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, username: &str, hashed_username: &str, encoded_verifier: &str) -> CoreResult<User> {
        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO users (id, username, hashed_username, encoded_verifier, roles) \
             VALUES ($1, $2, $3, $4, ARRAY[]::text[])",
        )
        .bind(id)
        .bind(username)
        .bind(hashed_username)
        .bind(encoded_verifier)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(User {
            id,
            username: username.to_string(),
            hashed_username: hashed_username.to_string(),
            encoded_verifier: encoded_verifier.to_string(),
            roles: HashSet::new(),
            last_login_at: None,
        })
    }

    async fn list_users(&self) -> CoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, hashed_username, encoded_verifier, roles, last_login_at FROM users ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(row_to_user).collect())
    }

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, hashed_username, encoded_verifier, roles, last_login_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(row_to_user))
    }

    async fn get_user_by_hashed_username(&self, hashed_username: &str) -> CoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, hashed_username, encoded_verifier, roles, last_login_at FROM users WHERE hashed_username = $1",
        )
        .bind(hashed_username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(row_to_user))
    }

    async fn get_user_roles(&self, id: Uuid) -> CoreResult<Vec<String>> {
        let row: Option<(Vec<String>,)> = sqlx::query_as("SELECT roles FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(|(roles,)| roles).unwrap_or_default())
    }

    async fn update_user_last_login(&self, id: Uuid) -> CoreResult<()> {
        sqlx::query("UPDATE users SET last_login_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn put_srp_in_flight(&self, row: &SrpInFlight) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO srp_in_flight (uid, encoded_server, expires_at) VALUES ($1, $2, $3) \
             ON CONFLICT (uid) DO UPDATE SET encoded_server = EXCLUDED.encoded_server, expires_at = EXCLUDED.expires_at",
        )
        .bind(row.uid)
        .bind(&row.encoded_server)
        .bind(row.expires_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn get_srp_in_flight(&self, uid: Uuid) -> CoreResult<Option<SrpInFlight>> {
        let row: Option<(Uuid, String, chrono::DateTime<chrono::Utc>)> =
            sqlx::query_as("SELECT uid, encoded_server, expires_at FROM srp_in_flight WHERE uid = $1")
                .bind(uid)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        Ok(row.map(|(uid, encoded_server, expires_at)| SrpInFlight { uid, encoded_server, expires_at }))
    }

    async fn take_srp_in_flight(&self, uid: Uuid) -> CoreResult<Option<SrpInFlight>> {
        let row: Option<(Uuid, String, chrono::DateTime<chrono::Utc>)> = sqlx::query_as(
            "DELETE FROM srp_in_flight WHERE uid = $1 RETURNING uid, encoded_server, expires_at",
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(|(uid, encoded_server, expires_at)| SrpInFlight { uid, encoded_server, expires_at }))
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        service_id: Uuid,
        refresh_hash: Option<&str>,
        expires_at: chrono::DateTime<chrono::Utc>,
    ) -> CoreResult<UserSession> {
        let id = ulid::Ulid::new().to_string();
        let created_at = chrono::Utc::now();
        sqlx::query(
            "INSERT INTO user_sessions (id, user_id, service_id, refresh_token_hash, expires_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(service_id)
        .bind(refresh_hash)
        .bind(expires_at)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(UserSession {
            id,
            user_id,
            service_id,
            refresh_token_hash: refresh_hash.map(str::to_string),
            expires_at,
            created_at,
            last_authenticated_at: None,
        })
    }

    async fn get_session(&self, id: &str) -> CoreResult<Option<UserSession>> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT id, user_id, service_id, refresh_token_hash, expires_at, created_at, last_authenticated_at \
             FROM user_sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(row_to_session))
    }

    async fn rotate_refresh(&self, session_id: &str, hash: &str) -> CoreResult<()> {
        sqlx::query("UPDATE user_sessions SET refresh_token_hash = $2 WHERE id = $1")
            .bind(session_id)
            .bind(hash)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn touch_last_authenticated(&self, session_id: &str) -> CoreResult<()> {
        sqlx::query("UPDATE user_sessions SET last_authenticated_at = now() WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn delete_session(&self, id: &str, user_id: Uuid) -> CoreResult<()> {
        sqlx::query("DELETE FROM user_sessions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn put_code_exchange(&self, row: &CodeExchangeRecord) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO code_exchange (hashed_code, session_id, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(&row.hashed_code)
        .bind(&row.session_id)
        .bind(row.expires_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn take_code_exchange(&self, hashed_code: &str) -> CoreResult<Option<CodeExchangeRecord>> {
        let row: Option<(String, String, chrono::DateTime<chrono::Utc>)> = sqlx::query_as(
            "DELETE FROM code_exchange WHERE hashed_code = $1 RETURNING hashed_code, session_id, expires_at",
        )
        .bind(hashed_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(|(hashed_code, session_id, expires_at)| CodeExchangeRecord { hashed_code, session_id, expires_at }))
    }
}
