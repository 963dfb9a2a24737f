//! Shared application state, assembled once in `main` and cloned cheaply
//! (every field is an `Arc`) into both routers and the CLI.

use crate::config::Settings;
use auth_core::{JwkManager, M2MEngine, ServiceRegistry, SrpEngine, TokenEngine};
use database_layer::{PgKeyStore, PgM2MStore, PgServiceStore, PgUserStore};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub pool: PgPool,
    pub services: Arc<ServiceRegistry>,
    pub jwks: Arc<JwkManager>,
    pub tokens: Arc<TokenEngine>,
    pub srp: Arc<SrpEngine>,
    pub m2m: Arc<M2MEngine>,
    /// The "Kuura" service bootstrapped on first boot; `/v1/me` verifies
    /// its own access cookie against this service's JWKS.
    pub internal_service_id: Uuid,
}

impl AppState {
    pub async fn new(settings: Arc<Settings>, pool: PgPool, kek: &[u8]) -> anyhow::Result<Self> {
        let key_store = Arc::new(PgKeyStore::new(pool.clone()));
        let service_store: Arc<PgServiceStore> = Arc::new(PgServiceStore::new(pool.clone()));
        let user_store: Arc<PgUserStore> = Arc::new(PgUserStore::new(pool.clone()));
        let m2m_store: Arc<PgM2MStore> = Arc::new(PgM2MStore::new(pool.clone()));

        let envelope = crypto::Envelope::new(kek)?;
        let jwks = Arc::new(JwkManager::new(key_store, envelope));
        let services = Arc::new(ServiceRegistry::new(service_store.clone()));
        let hasher = crypto::TokenHasher::default();
        let tokens = Arc::new(TokenEngine::new(
            user_store.clone(),
            service_store.clone(),
            jwks.clone(),
            hasher,
            settings.jwt_issuer.clone(),
            settings.token_code_secret.clone(),
        ));
        let srp = Arc::new(SrpEngine::new(user_store));
        let m2m = Arc::new(M2MEngine::new(m2m_store, service_store, tokens.clone()));

        let internal_service_id = services.ensure_internal_service(&settings.public_kuura_domain).await?;
        if jwks.get_jwks(internal_service_id).await?.is_empty() {
            jwks.rotate(internal_service_id).await?;
        }

        Ok(Self { settings, pool, services, jwks, tokens, srp, m2m, internal_service_id })
    }
}
