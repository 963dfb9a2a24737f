//! Token engine (component H): session creation, access-token issuance,
//! and the code-exchange handoff.

use crate::error::{CoreError, CoreResult};
use crate::jwk::JwkManager;
use crate::models::{AccessTokenClaims, ClientType, CodeExchangeRecord, TokenInfo, User};
use crate::store::{ServiceStore, UserStore};
use hmac::{Hmac, Mac};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use sha2::Sha256;
use std::sync::Arc;
use uuid::Uuid;

const REFRESH_TOKEN_LEN: usize = 32;
const REFRESH_TOKEN_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const SESSION_TTL: chrono::Duration = chrono::Duration::days(7);
const CODE_EXCHANGE_TTL: chrono::Duration = chrono::Duration::minutes(5);

pub struct TokenEngine {
    users: Arc<dyn UserStore>,
    services: Arc<dyn ServiceStore>,
    jwks: Arc<JwkManager>,
    hasher: crypto::TokenHasher,
    issuer: String,
    code_secret: Vec<u8>,
}

impl TokenEngine {
    pub fn new(
        users: Arc<dyn UserStore>,
        services: Arc<dyn ServiceStore>,
        jwks: Arc<JwkManager>,
        hasher: crypto::TokenHasher,
        issuer: String,
        code_secret: Vec<u8>,
    ) -> Self {
        Self {
            users,
            services,
            jwks,
            hasher,
            issuer,
            code_secret,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn generate_refresh_token(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..REFRESH_TOKEN_LEN)
            .map(|_| REFRESH_TOKEN_CHARSET[rng.gen_range(0..REFRESH_TOKEN_CHARSET.len())] as char)
            .collect()
    }

    /// Mints a ULID session id, a fresh opaque refresh token, hashes and
    /// persists it with a 7-day expiry, and updates the user's last login.
    pub async fn create_session(&self, uid: Uuid, service_id: Uuid) -> CoreResult<(String, String)> {
        let refresh_token = self.generate_refresh_token();
        let hash = self.hasher.hash(&refresh_token)?;
        let session = self
            .users
            .create_session(uid, service_id, Some(&hash), chrono::Utc::now() + SESSION_TTL)
            .await?;
        self.users.update_user_last_login(uid).await?;
        Ok((session.id, refresh_token))
    }

    /// §4.8 steps 1-8. Rotates the refresh token only after signing
    /// succeeds, so a signing failure leaves the client able to retry with
    /// the same refresh token.
    pub async fn create_access_token(&self, session_id: &str, presented_refresh: &str) -> CoreResult<TokenInfo> {
        let session = self
            .users
            .get_session(session_id)
            .await?
            .ok_or(CoreError::Unauthorized)?;
        if session.expires_at <= chrono::Utc::now() {
            return Err(CoreError::Unauthorized);
        }

        let roles = self.users.get_user_roles(session.user_id).await?;

        let stored_hash = session.refresh_token_hash.as_deref().ok_or(CoreError::Unauthorized)?;
        if !self.hasher.verify(stored_hash, presented_refresh)? {
            tracing::error!(session_id, "refresh token mismatch");
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
            iss: self.issuer.clone(),
            aud: vec![service.jwt_audience.clone()],
            sub: session.user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            session_id: session.id.clone(),
            roles,
            client_type: ClientType::User,
            service_id: service.id,
        };

        let access_token = self.sign(service.id, &claims).await?;

        let new_refresh = self.generate_refresh_token();
        let new_hash = self.hasher.hash(&new_refresh)?;
        self.users.rotate_refresh(&session.id, &new_hash).await?;
        self.users.touch_last_authenticated(&session.id).await?;

        Ok(TokenInfo {
            access_token,
            refresh_token: new_refresh,
            session_id: session.id,
            access_token_duration_secs: service.access_token_duration_secs,
        })
    }

    /// Reserves a session with no refresh token yet, stores a 5-minute
    /// single-use code keyed by its HMAC, and returns the redirect URL.
    pub async fn login_to_service(&self, uid: Uuid, service_id: Uuid) -> CoreResult<String> {
        let service = self.services.get(service_id).await?.ok_or(CoreError::ServiceNotFound)?;
        let session = self
            .users
            .create_session(uid, service_id, None, chrono::Utc::now() + SESSION_TTL)
            .await?;

        let code = self.generate_refresh_token();
        let hashed_code = self.hmac_code(&code)?;

        self.users
            .put_code_exchange(&CodeExchangeRecord {
                hashed_code,
                session_id: session.id,
                expires_at: chrono::Utc::now() + CODE_EXCHANGE_TTL,
            })
            .await?;

        Ok(format!("{}?code={}", service.login_redirect, code))
    }

    /// Consumes the code (delete-returning) and runs normal access-token
    /// issuance against the reserved session, minting its first refresh
    /// token.
    pub async fn exchange_code(&self, code: &str) -> CoreResult<TokenInfo> {
        let hashed_code = self.hmac_code(code)?;
        let record = self
            .users
            .take_code_exchange(&hashed_code)
            .await?
            .ok_or(CoreError::Unauthorized)?;
        if record.expires_at <= chrono::Utc::now() {
            return Err(CoreError::Unauthorized);
        }

        let session = self
            .users
            .get_session(&record.session_id)
            .await?
            .ok_or(CoreError::Unauthorized)?;

        let placeholder_refresh = self.generate_refresh_token();
        let placeholder_hash = self.hasher.hash(&placeholder_refresh)?;
        self.users.rotate_refresh(&session.id, &placeholder_hash).await?;

        self.create_access_token(&session.id, &placeholder_refresh).await
    }

    /// Deletes the session backing `session_id` if it still exists.
    /// Idempotent: logging out twice is not an error, and the response
    /// never reveals whether a session existed (§7).
    pub async fn invalidate_session(&self, session_id: &str) -> CoreResult<()> {
        if let Some(session) = self.users.get_session(session_id).await? {
            self.users.delete_session(session_id, session.user_id).await?;
        }
        Ok(())
    }

    pub async fn get_user_profile(&self, user_id: Uuid) -> CoreResult<User> {
        self.users.get_user(user_id).await?.ok_or(CoreError::UserNotFound)
    }

    /// Verifies an access token issued for `service_id`, checking the
    /// signature against the service's current JWKS rather than trusting
    /// the cookie's own claims. Mirrors [`Self::sign`] in reverse.
    pub async fn verify_access_token(&self, service_id: Uuid, token: &str) -> CoreResult<AccessTokenClaims> {
        let header = jsonwebtoken::decode_header(token).map_err(|_| CoreError::Unauthorized)?;
        let kid = header.kid.ok_or(CoreError::Unauthorized)?;

        let keys = self.jwks.get_jwks(service_id).await?;
        let jwk = keys.iter().find(|k| k.id == kid).ok_or(CoreError::Unauthorized)?;
        let x = jwk.key_data.get("x").and_then(|v| v.as_str()).ok_or(CoreError::Unauthorized)?;
        let y = jwk.key_data.get("y").and_then(|v| v.as_str()).ok_or(CoreError::Unauthorized)?;
        let decoding_key = DecodingKey::from_ec_components(x, y).map_err(|_| CoreError::Unauthorized)?;

        let service = self.services.get(service_id).await?.ok_or(CoreError::ServiceNotFound)?;
        let mut validation = Validation::new(Algorithm::ES384);
        validation.set_audience(&[service.jwt_audience]);
        validation.set_issuer(&[self.issuer.clone()]);

        jsonwebtoken::decode::<AccessTokenClaims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| CoreError::Unauthorized)
    }

    fn hmac_code(&self, code: &str) -> CoreResult<String> {
        use base64::Engine;
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.code_secret)
            .map_err(|e| CoreError::Internal(anyhow::anyhow!(e)))?;
        mac.update(code.as_bytes());
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }

    pub(crate) async fn sign(&self, service_id: Uuid, claims: &AccessTokenClaims) -> CoreResult<String> {
        use p384::pkcs8::{EncodePrivateKey, LineEnding};

        let (kid, signing_key) = self.jwks.get_signing_key(service_id).await?;
        let pem = signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CoreError::Internal(anyhow::anyhow!(e)))?;
        let encoding_key =
            EncodingKey::from_ec_pem(pem.as_bytes()).map_err(|e| CoreError::Internal(e.into()))?;
        let mut header = Header::new(Algorithm::ES384);
        header.kid = Some(kid);
        jsonwebtoken::encode(&header, claims, &encoding_key).map_err(|e| CoreError::Internal(e.into()))
    }
}
