//! Service registry (component E): relying-service CRUD plus the
//! "Kuura" internal-service bootstrap.

use crate::error::{CoreError, CoreResult};
use crate::models::{InstanceSettingKey, Service};
use crate::store::ServiceStore;
use std::sync::Arc;
use uuid::Uuid;

const INTERNAL_SERVICE_NAME: &str = "Kuura";
const INTERNAL_SERVICE_AUDIENCE: &str = "kuura";
const INTERNAL_SERVICE_COOKIE: &str = "kuura_access";
const INTERNAL_ACCESS_TOKEN_DURATION_SECS: i64 = 15 * 60;

pub struct ServiceRegistry {
    store: Arc<dyn ServiceStore>,
}

impl ServiceRegistry {
    pub fn new(store: Arc<dyn ServiceStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, service: &Service) -> CoreResult<()> {
        self.store.create(service).await
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<Service> {
        self.store.get(id).await?.ok_or(CoreError::ServiceNotFound)
    }

    pub async fn list(&self) -> CoreResult<Vec<Service>> {
        self.store.list().await
    }

    pub async fn update(&self, service: &Service) -> CoreResult<()> {
        self.store.update(service).await
    }

    pub async fn delete(&self, id: Uuid) -> CoreResult<()> {
        self.store.delete(id).await
    }

    /// On first boot, creates the internal "Kuura" service and records its
    /// id under [`InstanceSettingKey::InternalServiceId`]. On later boots,
    /// reconciles name/audience/cookie/redirect with the current domain —
    /// the id itself is append-once (§9 Open Question): a hostile operator
    /// flipping `INTERNAL_SERVICE_ID` to point at a foreign service is out
    /// of scope for this reconciliation, which only ever reads the id back.
    pub async fn ensure_internal_service(&self, domain: &str) -> CoreResult<Uuid> {
        let redirect = format!("https://{domain}/home");

        if let Some(existing_id) = self.store.get_setting(InstanceSettingKey::InternalServiceId).await? {
            let id = Uuid::parse_str(&existing_id)
                .map_err(|e| CoreError::Internal(anyhow::anyhow!("corrupt INTERNAL_SERVICE_ID setting: {e}")))?;
            let mut service = self.store.get(id).await?.ok_or(CoreError::ServiceNotFound)?;

            let drifted = service.name != INTERNAL_SERVICE_NAME
                || service.jwt_audience != INTERNAL_SERVICE_AUDIENCE
                || service.access_token_cookie_name != INTERNAL_SERVICE_COOKIE
                || service.login_redirect != redirect
                || service.api_domain != domain;

            if drifted {
                service.name = INTERNAL_SERVICE_NAME.to_string();
                service.jwt_audience = INTERNAL_SERVICE_AUDIENCE.to_string();
                service.access_token_cookie_name = INTERNAL_SERVICE_COOKIE.to_string();
                service.login_redirect = redirect;
                service.api_domain = domain.to_string();
                service.modified_at = chrono::Utc::now();
                self.store.update(&service).await?;
            }

            return Ok(id);
        }

        let now = chrono::Utc::now();
        let service = Service {
            id: Uuid::now_v7(),
            name: INTERNAL_SERVICE_NAME.to_string(),
            jwt_audience: INTERNAL_SERVICE_AUDIENCE.to_string(),
            api_domain: domain.to_string(),
            login_redirect: redirect,
            access_token_duration_secs: INTERNAL_ACCESS_TOKEN_DURATION_SECS,
            access_token_cookie_name: INTERNAL_SERVICE_COOKIE.to_string(),
            description: Some("Kuura's own internal relying service".to_string()),
            contact_name: None,
            contact_email: None,
            created_at: now,
            modified_at: now,
        };
        self.store.create(&service).await?;
        self.store
            .set_setting(InstanceSettingKey::InternalServiceId, &service.id.to_string())
            .await?;
        Ok(service.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreResult;
    use crate::models::Service;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeServiceStore {
        services: Mutex<HashMap<Uuid, Service>>,
        settings: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl ServiceStore for FakeServiceStore {
        async fn create(&self, service: &Service) -> CoreResult<()> {
            self.services.lock().unwrap().insert(service.id, service.clone());
            Ok(())
        }
        async fn get(&self, id: Uuid) -> CoreResult<Option<Service>> {
            Ok(self.services.lock().unwrap().get(&id).cloned())
        }
        async fn get_by_name(&self, name: &str) -> CoreResult<Option<Service>> {
            Ok(self.services.lock().unwrap().values().find(|s| s.name == name).cloned())
        }
        async fn list(&self) -> CoreResult<Vec<Service>> {
            Ok(self.services.lock().unwrap().values().cloned().collect())
        }
        async fn update(&self, service: &Service) -> CoreResult<()> {
            self.services.lock().unwrap().insert(service.id, service.clone());
            Ok(())
        }
        async fn delete(&self, id: Uuid) -> CoreResult<()> {
            self.services.lock().unwrap().remove(&id);
            Ok(())
        }
        async fn get_setting(&self, key: InstanceSettingKey) -> CoreResult<Option<String>> {
            Ok(self.settings.lock().unwrap().get(key.as_str()).cloned())
        }
        async fn set_setting(&self, key: InstanceSettingKey, value: &str) -> CoreResult<()> {
            self.settings.lock().unwrap().insert(key.as_str().to_string(), value.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn bootstrap_is_idempotent_and_append_once() {
        let store = Arc::new(FakeServiceStore::default());
        let registry = ServiceRegistry::new(store.clone());

        let first = registry.ensure_internal_service("kuura.example.com").await.unwrap();
        let second = registry.ensure_internal_service("kuura.example.com").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.services.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reconciles_drifted_fields_without_repointing_id() {
        let store = Arc::new(FakeServiceStore::default());
        let registry = ServiceRegistry::new(store.clone());

        let id = registry.ensure_internal_service("old.example.com").await.unwrap();
        {
            let mut services = store.services.lock().unwrap();
            let svc = services.get_mut(&id).unwrap();
            svc.login_redirect = "https://stale.example.com/home".to_string();
        }

        let again = registry.ensure_internal_service("new.example.com").await.unwrap();
        assert_eq!(again, id);
        let service = store.get(id).await.unwrap().unwrap();
        assert_eq!(service.api_domain, "new.example.com");
        assert_eq!(service.login_redirect, "https://new.example.com/home");
    }
}
