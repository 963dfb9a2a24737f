//! Data model shared by the storage ports and the engines above them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub jwt_audience: String,
    pub api_domain: String,
    pub login_redirect: String,
    pub access_token_duration_secs: i64,
    pub access_token_cookie_name: String,
    pub description: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub modified_at: chrono::DateTime<chrono::Utc>,
}

/// Status of a service's key, tracked per `(service_id, jwk_private_id)` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    Future,
    Current,
    Retired,
}

/// The sealed half of a JWK record. `encrypted_key_data` is the AES-256-GCM
/// ciphertext of the JSON-encoded P-384 private key under the process KEK.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwkPrivateRecord {
    pub id: String,
    pub service_id: Uuid,
    pub encrypted_key_data: Vec<u8>,
    pub nonce: [u8; 12],
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// The public half of a JWK record; shares `id` with its private counterpart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwkPublicRecord {
    pub id: String,
    pub service_id: Uuid,
    pub key_data: serde_json::Value,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceKeyState {
    pub service_id: Uuid,
    pub jwk_private_id: String,
    pub status: KeyStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub hashed_username: String,
    pub encoded_verifier: String,
    pub roles: HashSet<String>,
    pub last_login_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// The server's in-flight SRP state for one login attempt. Consumed
/// (deleted) by the verify step; never updated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SrpInFlight {
    pub uid: Uuid,
    pub encoded_server: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSession {
    pub id: String,
    pub user_id: Uuid,
    pub service_id: Uuid,
    pub refresh_token_hash: Option<String>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_authenticated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct M2mSession {
    pub id: String,
    pub subject_id: String,
    pub template_id: String,
    pub service_id: Uuid,
    pub refresh_token_hash: String,
    pub roles: Vec<String>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_authenticated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A single-use cross-origin handoff. `hashed_code` is
/// `HMAC-SHA-256(code, server_secret)`, base64url-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeExchangeRecord {
    pub hashed_code: String,
    pub session_id: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleTemplate {
    pub id: String,
    pub service_id: Uuid,
    pub roles: Vec<String>,
}

/// The closed set of instance-setting keys. Unknown keys are rejected
/// rather than silently accepted (§3, Open Question on append-once ids).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceSettingKey {
    InternalServiceId,
}

impl InstanceSettingKey {
    pub fn as_str(self) -> &'static str {
        match self {
            InstanceSettingKey::InternalServiceId => "INTERNAL_SERVICE_ID",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "INTERNAL_SERVICE_ID" => Some(InstanceSettingKey::InternalServiceId),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSetting {
    pub key: InstanceSettingKey,
    pub value: String,
}

/// Everything the token engine needs to return to an HTTP handler after
/// issuing or refreshing an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub access_token: String,
    pub refresh_token: String,
    pub session_id: String,
    pub access_token_duration_secs: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    User,
    Machine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub iss: String,
    pub aud: Vec<String>,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub session_id: String,
    pub roles: Vec<String>,
    pub client_type: ClientType,
    pub service_id: Uuid,
}
