//! Postgres adapter for [`auth_core::store::M2MStore`] (component I).

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use auth_core::error::CoreResult;
use auth_core::models::{M2mSession, RoleTemplate};
use auth_core::store::M2MStore;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgM2MStore {
    pool: PgPool,
}

impl PgM2MStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

type M2mSessionRow = (
    String,
    String,
    String,
    Uuid,
    String,
    Vec<String>,
    chrono::DateTime<chrono::Utc>,
    chrono::DateTime<chrono::Utc>,
    Option<chrono::DateTime<chrono::Utc>>,
);

fn row_to_m2m_session(row: M2mSessionRow) -> M2mSession {
    let (id, subject_id, template_id, service_id, refresh_token_hash, roles, expires_at, created_at, last_authenticated_at) = row;
    M2mSession { id, subject_id, template_id, service_id, refresh_token_hash, roles, expires_at, created_at, last_authenticated_at }
}

#[async_trait]
impl M2MStore for PgM2MStore {
    async fn create_role_template(&self, template: &RoleTemplate) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO role_templates (id, service_id, roles) VALUES ($1, $2, $3)",
        )
        .bind(&template.id)
        .bind(template.service_id)
        .bind(&template.roles)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn get_role_template(&self, service_id: Uuid, template_id: &str) -> CoreResult<Option<RoleTemplate>> {
        let row: Option<(String, Uuid, Vec<String>)> = sqlx::query_as(
            "SELECT id, service_id, roles FROM role_templates WHERE service_id = $1 AND id = $2",
        )
        .bind(service_id)
        .bind(template_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(|(id, service_id, roles)| RoleTemplate { id, service_id, roles }))
    }

    async fn list_role_templates(&self, service_id: Uuid) -> CoreResult<Vec<RoleTemplate>> {
        let rows: Vec<(String, Uuid, Vec<String>)> = sqlx::query_as(
            "SELECT id, service_id, roles FROM role_templates WHERE service_id = $1",
        )
        .bind(service_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(|(id, service_id, roles)| RoleTemplate { id, service_id, roles }).collect())
    }

    async fn create_m2m_session(&self, session: &M2mSession) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO m2m_sessions (id, subject_id, template_id, service_id, refresh_token_hash, roles, \
             expires_at, created_at, last_authenticated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&session.id)
        .bind(&session.subject_id)
        .bind(&session.template_id)
        .bind(session.service_id)
        .bind(&session.refresh_token_hash)
        .bind(&session.roles)
        .bind(session.expires_at)
        .bind(session.created_at)
        .bind(session.last_authenticated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn get_m2m_session(&self, id: &str) -> CoreResult<Option<M2mSession>> {
        let row = sqlx::query_as::<_, M2mSessionRow>(
            "SELECT id, subject_id, template_id, service_id, refresh_token_hash, roles, \
             expires_at, created_at, last_authenticated_at FROM m2m_sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(row_to_m2m_session))
    }

    async fn rotate_m2m_refresh(&self, session_id: &str, hash: &str) -> CoreResult<()> {
        sqlx::query("UPDATE m2m_sessions SET refresh_token_hash = $2 WHERE id = $1")
            .bind(session_id)
            .bind(hash)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn touch_m2m_last_authenticated(&self, session_id: &str) -> CoreResult<()> {
        sqlx::query("UPDATE m2m_sessions SET last_authenticated_at = now() WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
