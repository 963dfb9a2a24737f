//! JWK manager (component D): key creation, rotation, current-key
//! selection, and export, operating per `service_id`.

use crate::error::{CoreError, CoreResult};
use crate::models::{JwkPrivateRecord, JwkPublicRecord, KeyStatus};
use crate::store::KeyStore;
use crypto::Envelope;
use ecdsa::SigningKey;
use p384::NistP384;
use rand::rngs::OsRng;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub struct JwkManager {
    store: Arc<dyn KeyStore>,
    envelope: Envelope,
}

impl JwkManager {
    pub fn new(store: Arc<dyn KeyStore>, envelope: Envelope) -> Self {
        Self { store, envelope }
    }

    /// Generates a P-384 key pair, seals the private half, and stores both
    /// halves plus a `future` state row in one transaction (delegated to
    /// the store's `store` implementation).
    pub async fn create_key(&self, service_id: Uuid) -> CoreResult<String> {
        let signing_key = SigningKey::<NistP384>::random(&mut OsRng);
        let kid = ulid::Ulid::new().to_string();

        let private_jwk = p384_private_jwk(&signing_key, &kid)?;
        let public_jwk = p384_public_jwk(&signing_key, &kid)?;

        let plaintext = serde_json::to_vec(&private_jwk).map_err(|e| CoreError::Internal(e.into()))?;
        let (ciphertext, nonce) = self.envelope.seal(&plaintext)?;

        let now = chrono::Utc::now();
        let private = JwkPrivateRecord {
            id: kid.clone(),
            service_id,
            encrypted_key_data: ciphertext,
            nonce,
            created_at: now,
        };
        let public = JwkPublicRecord {
            id: kid.clone(),
            service_id,
            key_data: public_jwk,
            created_at: now,
        };

        self.store.store(service_id, &private, &public).await?;
        Ok(kid)
    }

    /// ① create; ② promote the new key to current, demoting the prior
    /// current to retired; ③ delete the oldest retired key.
    pub async fn rotate(&self, service_id: Uuid) -> CoreResult<String> {
        self.create_key(service_id).await?;
        let upcoming = self
            .store
            .get_upcoming(service_id)
            .await?
            .ok_or_else(|| CoreError::Internal(anyhow::anyhow!("no future key after create_key")))?;
        self.store.set_current(service_id, &upcoming).await?;
        if let Some(oldest) = self.store.get_oldest_retired(service_id).await? {
            self.store.delete(service_id, &oldest).await?;
        }
        Ok(upcoming)
    }

    /// Every public record for the service, regardless of status. Clients
    /// must accept retired-but-still-valid tokens until a later rotation
    /// removes the key.
    pub async fn get_jwks(&self, service_id: Uuid) -> CoreResult<Vec<JwkPublicRecord>> {
        self.store.list_public(service_id).await
    }

    /// The private half of the newest `current` record, decrypted.
    pub async fn get_signing_key(&self, service_id: Uuid) -> CoreResult<(String, SigningKey<NistP384>)> {
        let record = self
            .store
            .get_current_private(service_id)
            .await?
            .ok_or(CoreError::ServiceNotFound)?;
        let key = self.decrypt_private(&record)?;
        Ok((record.id, key))
    }

    pub async fn export(&self, service_id: Uuid, id: &str) -> CoreResult<SigningKey<NistP384>> {
        let record = self
            .store
            .get_private(service_id, id)
            .await?
            .ok_or(CoreError::InvalidArgument(format!("no such key {id}")))?;
        self.decrypt_private(&record)
    }

    /// Fails [`CoreError::InvalidOp`] if `id` is the current signing key.
    pub async fn remove(&self, service_id: Uuid, id: &str) -> CoreResult<()> {
        let states = self.store.get_key_states(service_id).await?;
        if states.get(id) == Some(&KeyStatus::Current) {
            return Err(CoreError::InvalidOp);
        }
        self.store.delete(service_id, id).await
    }

    pub async fn key_status(&self, service_id: Uuid) -> CoreResult<HashMap<String, KeyStatus>> {
        self.store.get_key_states(service_id).await
    }

    fn decrypt_private(&self, record: &JwkPrivateRecord) -> CoreResult<SigningKey<NistP384>> {
        let plaintext = self
            .envelope
            .open(&record.encrypted_key_data, &record.nonce)?;
        let jwk: serde_json::Value = serde_json::from_slice(&plaintext).map_err(|e| CoreError::Internal(e.into()))?;
        let d = jwk
            .get("d")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CoreError::Internal(anyhow::anyhow!("stored JWK missing 'd'")))?;
        let bytes = base64_url_decode(d).map_err(|e| CoreError::Internal(anyhow::anyhow!(e)))?;
        SigningKey::from_slice(&bytes).map_err(|e| CoreError::Internal(anyhow::anyhow!(e)))
    }
}

fn p384_private_jwk(key: &SigningKey<NistP384>, kid: &str) -> CoreResult<serde_json::Value> {
    let verifying_key = key.verifying_key();
    let point = verifying_key.to_encoded_point(false);
    let x = point.x().ok_or_else(|| CoreError::Internal(anyhow::anyhow!("missing x")))?;
    let y = point.y().ok_or_else(|| CoreError::Internal(anyhow::anyhow!("missing y")))?;
    Ok(serde_json::json!({
        "kty": "EC",
        "crv": "P-384",
        "use": "sig",
        "alg": "ES384",
        "kid": kid,
        "x": base64_url_encode(x),
        "y": base64_url_encode(y),
        "d": base64_url_encode(key.to_bytes().as_slice()),
    }))
}

fn p384_public_jwk(key: &SigningKey<NistP384>, kid: &str) -> CoreResult<serde_json::Value> {
    let verifying_key = key.verifying_key();
    let point = verifying_key.to_encoded_point(false);
    let x = point.x().ok_or_else(|| CoreError::Internal(anyhow::anyhow!("missing x")))?;
    let y = point.y().ok_or_else(|| CoreError::Internal(anyhow::anyhow!("missing y")))?;
    Ok(serde_json::json!({
        "kty": "EC",
        "crv": "P-384",
        "use": "sig",
        "alg": "ES384",
        "kid": kid,
        "x": base64_url_encode(x),
        "y": base64_url_encode(y),
    }))
}

fn base64_url_encode(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn base64_url_decode(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::InMemoryKeyStore;

    fn envelope() -> Envelope {
        Envelope::new(&[7u8; 32]).unwrap()
    }

    #[tokio::test]
    async fn rotation_conserves_one_current_one_future_at_most_one_retired() {
        let store = Arc::new(InMemoryKeyStore::default());
        let manager = JwkManager::new(store.clone(), envelope());
        let service_id = Uuid::new_v4();

        manager.create_key(service_id).await.unwrap();
        for _ in 0..5 {
            manager.rotate(service_id).await.unwrap();
        }

        let states = manager.key_status(service_id).await.unwrap();
        let current = states.values().filter(|s| **s == KeyStatus::Current).count();
        let future = states.values().filter(|s| **s == KeyStatus::Future).count();
        let retired = states.values().filter(|s| **s == KeyStatus::Retired).count();
        assert_eq!(current, 1);
        assert_eq!(future, 1);
        assert!(retired <= 1);
    }

    #[tokio::test]
    async fn signing_key_freshness_after_rotate() {
        let store = Arc::new(InMemoryKeyStore::default());
        let manager = JwkManager::new(store.clone(), envelope());
        let service_id = Uuid::new_v4();

        manager.create_key(service_id).await.unwrap();
        let upcoming_before = store.get_upcoming(service_id).await.unwrap().unwrap();
        let promoted = manager.rotate(service_id).await.unwrap();
        assert_eq!(upcoming_before, promoted);

        let (signing_kid, _) = manager.get_signing_key(service_id).await.unwrap();
        assert_eq!(signing_kid, promoted);
    }

    #[tokio::test]
    async fn remove_current_key_fails() {
        let store = Arc::new(InMemoryKeyStore::default());
        let manager = JwkManager::new(store.clone(), envelope());
        let service_id = Uuid::new_v4();

        manager.create_key(service_id).await.unwrap();
        let upcoming = store.get_upcoming(service_id).await.unwrap().unwrap();
        manager.set_current_for_test(service_id, &upcoming).await;

        let err = manager.remove(service_id, &upcoming).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidOp));
    }
}

#[cfg(test)]
impl JwkManager {
    async fn set_current_for_test(&self, service_id: Uuid, id: &str) {
        self.store.set_current(service_id, id).await.unwrap();
    }
}
