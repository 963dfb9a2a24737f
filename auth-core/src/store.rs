//! Storage ports (§9 "dynamic dispatch to storage"). The engines in this
//! crate depend only on these traits; `database-layer` provides the single
//! production SQL adapter and tests substitute in-memory fakes.

use crate::error::CoreResult;
use crate::models::{
    CodeExchangeRecord, InstanceSettingKey, JwkPrivateRecord, JwkPublicRecord, KeyStatus,
    M2mSession, RoleTemplate, Service, SrpInFlight, User, UserSession,
};
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

/// Per-service ECDSA key records and status transitions (component C).
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Inserts the private record, its matching public record, and a
    /// `future` state row in a single transaction.
    async fn store(
        &self,
        service_id: Uuid,
        private: &JwkPrivateRecord,
        public: &JwkPublicRecord,
    ) -> CoreResult<()>;

    async fn get_public(&self, service_id: Uuid, id: &str) -> CoreResult<Option<JwkPublicRecord>>;
    async fn list_public(&self, service_id: Uuid) -> CoreResult<Vec<JwkPublicRecord>>;
    async fn get_private(&self, service_id: Uuid, id: &str) -> CoreResult<Option<JwkPrivateRecord>>;

    /// Newest `current` record for the service, ordered by `created_at desc`.
    async fn get_current_private(&self, service_id: Uuid) -> CoreResult<Option<JwkPrivateRecord>>;

    async fn delete(&self, service_id: Uuid, id: &str) -> CoreResult<()>;

    /// Promotes `next_id` to `current`, demoting any prior `current` for
    /// the service to `retired`, in a single transaction.
    async fn set_current(&self, service_id: Uuid, next_id: &str) -> CoreResult<()>;

    async fn get_upcoming(&self, service_id: Uuid) -> CoreResult<Option<String>>;
    async fn get_oldest_retired(&self, service_id: Uuid) -> CoreResult<Option<String>>;
    async fn get_key_states(&self, service_id: Uuid) -> CoreResult<HashMap<String, KeyStatus>>;
}

/// Relying-service metadata (component E).
#[async_trait]
pub trait ServiceStore: Send + Sync {
    async fn create(&self, service: &Service) -> CoreResult<()>;
    async fn get(&self, id: Uuid) -> CoreResult<Option<Service>>;
    async fn get_by_name(&self, name: &str) -> CoreResult<Option<Service>>;
    async fn list(&self) -> CoreResult<Vec<Service>>;
    async fn update(&self, service: &Service) -> CoreResult<()>;
    async fn delete(&self, id: Uuid) -> CoreResult<()>;

    async fn get_setting(&self, key: InstanceSettingKey) -> CoreResult<Option<String>>;
    async fn set_setting(&self, key: InstanceSettingKey, value: &str) -> CoreResult<()>;
}

/// User records, session rows, and the SRP in-flight row (components F/G).
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, username: &str, hashed_username: &str, encoded_verifier: &str) -> CoreResult<User>;
    async fn list_users(&self) -> CoreResult<Vec<User>>;
    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>>;
    async fn get_user_by_hashed_username(&self, hashed_username: &str) -> CoreResult<Option<User>>;
    async fn get_user_roles(&self, id: Uuid) -> CoreResult<Vec<String>>;
    async fn update_user_last_login(&self, id: Uuid) -> CoreResult<()>;

    /// Upserts the in-flight row for `uid`; fails the caller's own
    /// `AlreadyLoggingIn` check first (the engine, not the store, enforces
    /// the one-login-at-a-time guard by reading before writing).
    async fn put_srp_in_flight(&self, row: &SrpInFlight) -> CoreResult<()>;
    async fn get_srp_in_flight(&self, uid: Uuid) -> CoreResult<Option<SrpInFlight>>;
    /// Deletes and returns the row in one statement ("get-and-delete").
    async fn take_srp_in_flight(&self, uid: Uuid) -> CoreResult<Option<SrpInFlight>>;

    async fn create_session(
        &self,
        user_id: Uuid,
        service_id: Uuid,
        refresh_hash: Option<&str>,
        expires_at: chrono::DateTime<chrono::Utc>,
    ) -> CoreResult<UserSession>;
    async fn get_session(&self, id: &str) -> CoreResult<Option<UserSession>>;
    async fn rotate_refresh(&self, session_id: &str, hash: &str) -> CoreResult<()>;
    async fn touch_last_authenticated(&self, session_id: &str) -> CoreResult<()>;
    async fn delete_session(&self, id: &str, user_id: Uuid) -> CoreResult<()>;

    async fn put_code_exchange(&self, row: &CodeExchangeRecord) -> CoreResult<()>;
    /// Deletes and returns the row in one statement ("get-and-delete").
    async fn take_code_exchange(&self, hashed_code: &str) -> CoreResult<Option<CodeExchangeRecord>>;
}

/// Role templates and M2M sessions (component I).
#[async_trait]
pub trait M2MStore: Send + Sync {
    async fn create_role_template(&self, template: &RoleTemplate) -> CoreResult<()>;
    async fn get_role_template(&self, service_id: Uuid, template_id: &str) -> CoreResult<Option<RoleTemplate>>;
    async fn list_role_templates(&self, service_id: Uuid) -> CoreResult<Vec<RoleTemplate>>;

    async fn create_m2m_session(&self, session: &M2mSession) -> CoreResult<()>;
    async fn get_m2m_session(&self, id: &str) -> CoreResult<Option<M2mSession>>;
    async fn rotate_m2m_refresh(&self, session_id: &str, hash: &str) -> CoreResult<()>;
    async fn touch_m2m_last_authenticated(&self, session_id: &str) -> CoreResult<()>;
}

/// Alias kept distinct from [`ServiceStore::get_setting`]/`set_setting` so
/// the core can depend on a narrower contract where only settings are
/// needed (bootstrap code, CLI commands).
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_setting(&self, key: InstanceSettingKey) -> CoreResult<Option<String>>;
    async fn set_setting(&self, key: InstanceSettingKey, value: &str) -> CoreResult<()>;
}

#[async_trait]
impl<T: ServiceStore + ?Sized> SettingsStore for T {
    async fn get_setting(&self, key: InstanceSettingKey) -> CoreResult<Option<String>> {
        ServiceStore::get_setting(self, key).await
    }

    async fn set_setting(&self, key: InstanceSettingKey, value: &str) -> CoreResult<()> {
        ServiceStore::set_setting(self, key, value).await
    }
}

/// Hand-written in-memory fakes of the storage ports, used only by this
/// crate's own unit tests.
#[cfg(test)]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct InMemoryKeyStore {
        inner: Mutex<Inner>,
    }

    #[derive(Default)]
    struct Inner {
        private: HashMap<(Uuid, String), JwkPrivateRecord>,
        public: HashMap<(Uuid, String), JwkPublicRecord>,
        states: HashMap<(Uuid, String), KeyStatus>,
    }

    #[async_trait]
    impl KeyStore for InMemoryKeyStore {
        async fn store(
            &self,
            service_id: Uuid,
            private: &JwkPrivateRecord,
            public: &JwkPublicRecord,
        ) -> CoreResult<()> {
            let mut inner = self.inner.lock().unwrap();
            inner.private.insert((service_id, private.id.clone()), private.clone());
            inner.public.insert((service_id, public.id.clone()), public.clone());
            inner.states.insert((service_id, private.id.clone()), KeyStatus::Future);
            Ok(())
        }

        async fn get_public(&self, service_id: Uuid, id: &str) -> CoreResult<Option<JwkPublicRecord>> {
            Ok(self.inner.lock().unwrap().public.get(&(service_id, id.to_string())).cloned())
        }

        async fn list_public(&self, service_id: Uuid) -> CoreResult<Vec<JwkPublicRecord>> {
            Ok(self
                .inner
                .lock()
                .unwrap()
                .public
                .iter()
                .filter(|((sid, _), _)| *sid == service_id)
                .map(|(_, v)| v.clone())
                .collect())
        }

        async fn get_private(&self, service_id: Uuid, id: &str) -> CoreResult<Option<JwkPrivateRecord>> {
            Ok(self.inner.lock().unwrap().private.get(&(service_id, id.to_string())).cloned())
        }

        async fn get_current_private(&self, service_id: Uuid) -> CoreResult<Option<JwkPrivateRecord>> {
            let inner = self.inner.lock().unwrap();
            let mut currents: Vec<_> = inner
                .states
                .iter()
                .filter(|((sid, _), status)| *sid == service_id && **status == KeyStatus::Current)
                .map(|((_, id), _)| inner.private.get(&(service_id, id.clone())).cloned().unwrap())
                .collect();
            currents.sort_by_key(|r| r.created_at);
            Ok(currents.pop())
        }

        async fn delete(&self, service_id: Uuid, id: &str) -> CoreResult<()> {
            let mut inner = self.inner.lock().unwrap();
            let key = (service_id, id.to_string());
            inner.private.remove(&key);
            inner.public.remove(&key);
            inner.states.remove(&key);
            Ok(())
        }

        async fn set_current(&self, service_id: Uuid, next_id: &str) -> CoreResult<()> {
            let mut inner = self.inner.lock().unwrap();
            let keys: Vec<String> = inner
                .states
                .iter()
                .filter(|((sid, _), status)| *sid == service_id && **status == KeyStatus::Current)
                .map(|((_, id), _)| id.clone())
                .collect();
            for id in keys {
                inner.states.insert((service_id, id), KeyStatus::Retired);
            }
            inner.states.insert((service_id, next_id.to_string()), KeyStatus::Current);
            Ok(())
        }

        async fn get_upcoming(&self, service_id: Uuid) -> CoreResult<Option<String>> {
            let inner = self.inner.lock().unwrap();
            let mut upcoming: Vec<&String> = inner
                .states
                .iter()
                .filter(|((sid, _), status)| *sid == service_id && **status == KeyStatus::Future)
                .map(|((_, id), _)| id)
                .collect();
            upcoming.sort();
            Ok(upcoming.first().map(|id| (*id).clone()))
        }

        async fn get_oldest_retired(&self, service_id: Uuid) -> CoreResult<Option<String>> {
            let inner = self.inner.lock().unwrap();
            let mut retired: Vec<_> = inner
                .states
                .iter()
                .filter(|((sid, _), status)| *sid == service_id && **status == KeyStatus::Retired)
                .map(|((_, id), _)| inner.private.get(&(service_id, id.clone())).cloned().unwrap())
                .collect();
            retired.sort_by_key(|r| r.created_at);
            Ok(retired.first().map(|r| r.id.clone()))
        }

        async fn get_key_states(&self, service_id: Uuid) -> CoreResult<HashMap<String, KeyStatus>> {
            Ok(self
                .inner
                .lock()
                .unwrap()
                .states
                .iter()
                .filter(|((sid, _), _)| *sid == service_id)
                .map(|((_, id), status)| (id.clone(), *status))
                .collect())
        }
    }
}
