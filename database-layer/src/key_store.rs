//! Postgres adapter for [`auth_core::store::KeyStore`] (component C).

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use auth_core::error::CoreResult;
use auth_core::models::{JwkPrivateRecord, JwkPublicRecord, KeyStatus};
use auth_core::store::KeyStore;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

pub struct PgKeyStore {
    pool: PgPool,
}

impl PgKeyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn status_from_str(s: &str) -> Option<KeyStatus> {
    match s {
        "future" => Some(KeyStatus::Future),
        "current" => Some(KeyStatus::Current),
        "retired" => Some(KeyStatus::Retired),
        _ => None,
    }
}

#[async_trait]
impl KeyStore for PgKeyStore {
    async fn store(
        &self,
        service_id: Uuid,
        private: &JwkPrivateRecord,
        public: &JwkPublicRecord,
    ) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query(
            "INSERT INTO jwk_private (id, service_id, encrypted_key_data, nonce, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&private.id)
        .bind(service_id)
        .bind(&private.encrypted_key_data)
        .bind(&private.nonce[..])
        .bind(private.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query(
            "INSERT INTO jwk_public (id, service_id, key_data, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&public.id)
        .bind(service_id)
        .bind(&public.key_data)
        .bind(public.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query(
            "INSERT INTO service_key_state (service_id, jwk_private_id, status) VALUES ($1, $2, 'future')",
        )
        .bind(service_id)
        .bind(&private.id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn get_public(&self, service_id: Uuid, id: &str) -> CoreResult<Option<JwkPublicRecord>> {
        let row = sqlx::query_as::<_, (String, Uuid, serde_json::Value, chrono::DateTime<chrono::Utc>)>(
            "SELECT id, service_id, key_data, created_at FROM jwk_public WHERE service_id = $1 AND id = $2",
        )
        .bind(service_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|(id, service_id, key_data, created_at)| JwkPublicRecord {
            id,
            service_id,
            key_data,
            created_at,
        }))
    }

    async fn list_public(&self, service_id: Uuid) -> CoreResult<Vec<JwkPublicRecord>> {
        let rows = sqlx::query_as::<_, (String, Uuid, serde_json::Value, chrono::DateTime<chrono::Utc>)>(
            "SELECT id, service_id, key_data, created_at FROM jwk_public WHERE service_id = $1 ORDER BY created_at",
        )
        .bind(service_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|(id, service_id, key_data, created_at)| JwkPublicRecord { id, service_id, key_data, created_at })
            .collect())
    }

    async fn get_private(&self, service_id: Uuid, id: &str) -> CoreResult<Option<JwkPrivateRecord>> {
        let row = sqlx::query_as::<_, (String, Uuid, Vec<u8>, Vec<u8>, chrono::DateTime<chrono::Utc>)>(
            "SELECT id, service_id, encrypted_key_data, nonce, created_at FROM jwk_private WHERE service_id = $1 AND id = $2",
        )
        .bind(service_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(|(id, service_id, encrypted_key_data, nonce, created_at)| {
            let nonce: [u8; 12] = nonce
                .try_into()
                .map_err(|_| auth_core::CoreError::Internal(anyhow::anyhow!("stored nonce is not 12 bytes")))?;
            Ok(JwkPrivateRecord { id, service_id, encrypted_key_data, nonce, created_at })
        })
        .transpose()
    }

    async fn get_current_private(&self, service_id: Uuid) -> CoreResult<Option<JwkPrivateRecord>> {
        let row = sqlx::query_as::<_, (String, Uuid, Vec<u8>, Vec<u8>, chrono::DateTime<chrono::Utc>)>(
            "SELECT p.id, p.service_id, p.encrypted_key_data, p.nonce, p.created_at \
             FROM jwk_private p \
             JOIN service_key_state s ON s.jwk_private_id = p.id AND s.service_id = p.service_id \
             WHERE p.service_id = $1 AND s.status = 'current' \
             ORDER BY p.created_at DESC, p.id DESC LIMIT 1",
        )
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(|(id, service_id, encrypted_key_data, nonce, created_at)| {
            let nonce: [u8; 12] = nonce
                .try_into()
                .map_err(|_| auth_core::CoreError::Internal(anyhow::anyhow!("stored nonce is not 12 bytes")))?;
            Ok(JwkPrivateRecord { id, service_id, encrypted_key_data, nonce, created_at })
        })
        .transpose()
    }

    async fn delete(&self, service_id: Uuid, id: &str) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        sqlx::query("DELETE FROM service_key_state WHERE service_id = $1 AND jwk_private_id = $2")
            .bind(service_id)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        sqlx::query("DELETE FROM jwk_public WHERE service_id = $1 AND id = $2")
            .bind(service_id)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        sqlx::query("DELETE FROM jwk_private WHERE service_id = $1 AND id = $2")
            .bind(service_id)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn set_current(&self, service_id: Uuid, next_id: &str) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        sqlx::query(
            "UPDATE service_key_state SET status = 'retired' WHERE service_id = $1 AND status = 'current'",
        )
        .bind(service_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
        sqlx::query(
            "UPDATE service_key_state SET status = 'current' WHERE service_id = $1 AND jwk_private_id = $2",
        )
        .bind(service_id)
        .bind(next_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn get_upcoming(&self, service_id: Uuid) -> CoreResult<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT jwk_private_id FROM service_key_state WHERE service_id = $1 AND status = 'future' \
             ORDER BY jwk_private_id LIMIT 1",
        )
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(|(id,)| id))
    }

    async fn get_oldest_retired(&self, service_id: Uuid) -> CoreResult<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT p.id FROM jwk_private p \
             JOIN service_key_state s ON s.jwk_private_id = p.id AND s.service_id = p.service_id \
             WHERE p.service_id = $1 AND s.status = 'retired' \
             ORDER BY p.created_at ASC LIMIT 1",
        )
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(|(id,)| id))
    }

    async fn get_key_states(&self, service_id: Uuid) -> CoreResult<HashMap<String, KeyStatus>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT jwk_private_id, status FROM service_key_state WHERE service_id = $1",
        )
        .bind(service_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|(id, status)| {
                status_from_str(&status)
                    .map(|s| (id, s))
                    .ok_or_else(|| auth_core::CoreError::Internal(anyhow::anyhow!("unknown key status {status}")))
            })
            .collect()
    }
}
