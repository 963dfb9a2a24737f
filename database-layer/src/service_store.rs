//! Postgres adapter for [`auth_core::store::ServiceStore`] (component E).

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use auth_core::error::CoreResult;
use auth_core::models::{InstanceSettingKey, Service};
use auth_core::store::ServiceStore;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgServiceStore {
    pool: PgPool,
}

impl PgServiceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

type ServiceRow = (
    Uuid,
    String,
    String,
    String,
    String,
    i64,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    chrono::DateTime<chrono::Utc>,
    chrono::DateTime<chrono::Utc>,
);

fn row_to_service(row: ServiceRow) -> Service {
    let (
        id,
        name,
        jwt_audience,
        api_domain,
        login_redirect,
        access_token_duration_secs,
        access_token_cookie_name,
        description,
        contact_name,
        contact_email,
        created_at,
        modified_at,
    ) = row;
    Service {
        id,
        name,
        jwt_audience,
        api_domain,
        login_redirect,
        access_token_duration_secs,
        access_token_cookie_name,
        description,
        contact_name,
        contact_email,
        created_at,
        modified_at,
    }
}

const SELECT_COLUMNS: &str = "id, name, jwt_audience, api_domain, login_redirect, \
     access_token_duration_secs, access_token_cookie_name, description, contact_name, \
     contact_email, created_at, modified_at";

#[async_trait]
impl ServiceStore for PgServiceStore {
    async fn create(&self, service: &Service) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO services (id, name, jwt_audience, api_domain, login_redirect, \
             access_token_duration_secs, access_token_cookie_name, description, contact_name, \
             contact_email, created_at, modified_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(service.id)
        .bind(&service.name)
        .bind(&service.jwt_audience)
        .bind(&service.api_domain)
        .bind(&service.login_redirect)
        .bind(service.access_token_duration_secs)
        .bind(&service.access_token_cookie_name)
        .bind(&service.description)
        .bind(&service.contact_name)
        .bind(&service.contact_email)
        .bind(service.created_at)
        .bind(service.modified_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> CoreResult<Option<Service>> {
        let row = sqlx::query_as::<_, ServiceRow>(&format!("SELECT {SELECT_COLUMNS} FROM services WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(row_to_service))
    }

    async fn get_by_name(&self, name: &str) -> CoreResult<Option<Service>> {
        let row = sqlx::query_as::<_, ServiceRow>(&format!("SELECT {SELECT_COLUMNS} FROM services WHERE name = $1"))
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(row_to_service))
    }

    async fn list(&self) -> CoreResult<Vec<Service>> {
        let rows = sqlx::query_as::<_, ServiceRow>(&format!("SELECT {SELECT_COLUMNS} FROM services ORDER BY created_at"))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(row_to_service).collect())
    }

    async fn update(&self, service: &Service) -> CoreResult<()> {
        sqlx::query(
            "UPDATE services SET name = $2, jwt_audience = $3, api_domain = $4, login_redirect = $5, \
             access_token_duration_secs = $6, access_token_cookie_name = $7, description = $8, \
             contact_name = $9, contact_email = $10, modified_at = $11 WHERE id = $1",
        )
        .bind(service.id)
        .bind(&service.name)
        .bind(&service.jwt_audience)
        .bind(&service.api_domain)
        .bind(&service.login_redirect)
        .bind(service.access_token_duration_secs)
        .bind(&service.access_token_cookie_name)
        .bind(&service.description)
        .bind(&service.contact_name)
        .bind(&service.contact_email)
        .bind(service.modified_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> CoreResult<()> {
        sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn get_setting(&self, key: InstanceSettingKey) -> CoreResult<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM instance_settings WHERE key = $1")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(|(v,)| v))
    }

    async fn set_setting(&self, key: InstanceSettingKey, value: &str) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO instance_settings (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(key.as_str())
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }
}
