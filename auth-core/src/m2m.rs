//! M2M engine (component I): role templates and machine-to-machine
//! sessions. Refresh mirrors the user token flow but skips the user-roles
//! lookup — roles come from the snapshot captured at session creation.

use crate::error::{CoreError, CoreResult};
use crate::models::{AccessTokenClaims, ClientType, M2mSession, RoleTemplate, TokenInfo};
use crate::store::{M2MStore, ServiceStore};
use crate::tokens::TokenEngine;
use std::sync::Arc;
use uuid::Uuid;

const M2M_SESSION_TTL: chrono::Duration = chrono::Duration::hours(1);

pub struct M2MEngine {
    store: Arc<dyn M2MStore>,
    services: Arc<dyn ServiceStore>,
    tokens: Arc<TokenEngine>,
}

impl M2MEngine {
    pub fn new(store: Arc<dyn M2MStore>, services: Arc<dyn ServiceStore>, tokens: Arc<TokenEngine>) -> Self {
        Self { store, services, tokens }
    }

    pub async fn create_role_template(&self, service_id: Uuid, template_id: &str, roles: Vec<String>) -> CoreResult<()> {
        self.store
            .create_role_template(&RoleTemplate {
                id: template_id.to_string(),
                service_id,
                roles,
            })
            .await
    }

    pub async fn list_role_templates(&self, service_id: Uuid) -> CoreResult<Vec<RoleTemplate>> {
        self.store.list_role_templates(service_id).await
    }

    pub async fn create_m2m_session(&self, service_id: Uuid, subject_id: &str, template_id: &str) -> CoreResult<(String, String)> {
        let template = self
            .store
            .get_role_template(service_id, template_id)
            .await?
            .ok_or_else(|| CoreError::InvalidArgument(format!("no such role template {template_id}")))?;

        let refresh_token = self.tokens.generate_refresh_token();
        let hash = crypto::TokenHasher::default().hash(&refresh_token)?;
        let id = ulid::Ulid::new().to_string();
        let now = chrono::Utc::now();

        self.store
            .create_m2m_session(&M2mSession {
                id: id.clone(),
                subject_id: subject_id.to_string(),
                template_id: template_id.to_string(),
                service_id,
                refresh_token_hash: hash,
                roles: template.roles,
                expires_at: now + M2M_SESSION_TTL,
                created_at: now,
                last_authenticated_at: None,
            })
            .await?;

        Ok((id, refresh_token))
    }

    /// Mirrors §4.8 steps 1-7 with `client_type = "machine"`.
    pub async fn refresh_access_token(&self, session_id: &str, presented_refresh: &str) -> CoreResult<TokenInfo> {
        let session = self
            .store
            .get_m2m_session(session_id)
            .await?
            .ok_or(CoreError::Unauthorized)?;
        if session.expires_at <= chrono::Utc::now() {
            return Err(CoreError::Unauthorized);
        }

        let hasher = crypto::TokenHasher::default();
        if !hasher.verify(&session.refresh_token_hash, presented_refresh)? {
            tracing::error!(session_id, "M2M refresh token mismatch");
            return Err(CoreError::Unauthorized);
        }

        let service = self
            .services
            .get(session.service_id)
            .await?
            .ok_or(CoreError::ServiceNotFound)?;

        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::seconds(service.access_token_duration_secs);
        let claims = AccessTokenClaims {
            iss: self.tokens.issuer().to_string(),
            aud: vec![service.jwt_audience.clone()],
            sub: session.subject_id.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            session_id: session.id.clone(),
            roles: session.roles.clone(),
            client_type: ClientType::Machine,
            service_id: service.id,
        };

        let access_token = self.tokens.sign(service.id, &claims).await?;

        let new_refresh = self.tokens.generate_refresh_token();
        let new_hash = hasher.hash(&new_refresh)?;
        self.store.rotate_m2m_refresh(&session.id, &new_hash).await?;
        self.store.touch_m2m_last_authenticated(&session.id).await?;

        Ok(TokenInfo {
            access_token,
            refresh_token: new_refresh,
            session_id: session.id,
            access_token_duration_secs: service.access_token_duration_secs,
        })
    }
}
