//! `/v1/srp/*`: the two-step SRP-6a login handshake plus the group-vars
//! side channel a client-side SRP library reads once at startup.

use super::extract::{Validate, ValidJson};
use crate::cookies;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Serialize)]
pub struct SrpVarsResponse {
    prime: String,
    generator: String,
}

pub async fn vars(State(state): State<AppState>) -> Json<SrpVarsResponse> {
    let (prime, generator) = state.srp.group_vars();
    Json(SrpVarsResponse { prime, generator: format!("{generator:x}") })
}

#[derive(Deserialize)]
pub struct SrpBeginRequest {
    data: String,
}

impl Validate for SrpBeginRequest {
    fn validate(&self) -> HashMap<String, String> {
        let mut problems = HashMap::new();
        if self.data.is_empty() {
            problems.insert("data".into(), "'data' cannot be empty".into());
        } else if split_pair(&self.data).is_none() {
            problems.insert("data".into(), "'data' must be '<identity>:<public>'".into());
        }
        problems
    }
}

#[derive(Serialize)]
pub struct SrpDataResponse {
    data: String,
}

pub async fn begin(State(state): State<AppState>, ValidJson(body): ValidJson<SrpBeginRequest>) -> ApiResult<Json<SrpDataResponse>> {
    let (identity_hash, client_public_hex) = split_pair(&body.data).ok_or_else(|| {
        crate::error::validation_error(HashMap::from([("data".to_string(), "malformed 'data'".to_string())]))
    })?;
    let data = state.srp.begin(identity_hash, client_public_hex).await?;
    Ok(Json(SrpDataResponse { data }))
}

#[derive(Deserialize)]
pub struct SrpVerifyRequest {
    data: String,
    identity: String,
    target_service: String,
}

impl Validate for SrpVerifyRequest {
    fn validate(&self) -> HashMap<String, String> {
        let mut problems = HashMap::new();
        if self.data.is_empty() {
            problems.insert("data".into(), "'data' cannot be empty".into());
        } else if split_pair(&self.data).is_none() {
            problems.insert("data".into(), "'data' must be '<public>:<m1>'".into());
        }
        if self.identity.is_empty() {
            problems.insert("identity".into(), "'identity' cannot be empty".into());
        }
        if self.target_service.is_empty() {
            problems.insert("target_service".into(), "'target_service' cannot be empty".into());
        } else if Uuid::parse_str(&self.target_service).is_err() {
            problems.insert("target_service".into(), "'target_service' must be a valid UUID".into());
        }
        problems
    }
}

#[derive(Serialize)]
pub struct SrpVerifyResponse {
    success: bool,
    data: String,
}

pub async fn verify(State(state): State<AppState>, ValidJson(body): ValidJson<SrpVerifyRequest>) -> ApiResult<Response> {
    let (client_public_hex, m1_hex) = split_pair(&body.data).ok_or_else(|| {
        crate::error::validation_error(HashMap::from([("data".to_string(), "malformed 'data'".to_string())]))
    })?;
    let target_service = Uuid::parse_str(&body.target_service).map_err(|_| ApiError::from(auth_core::CoreError::InvalidServiceId))?;

    let (user_id, m2) = state.srp.verify(&body.identity, client_public_hex, m1_hex).await?;

    let (session_id, refresh_token) = state.tokens.create_session(user_id, target_service).await?;
    let token_info = state.tokens.create_access_token(&session_id, &refresh_token).await?;

    let mut response = Json(SrpVerifyResponse { success: true, data: m2 }).into_response();
    let domain = &state.settings.public_kuura_domain;
    for header in [
        cookies::refresh_cookie(&token_info.refresh_token, domain).to_header_value(),
        cookies::session_cookie(&token_info.session_id).to_header_value(),
        cookies::access_cookie(&token_info.access_token, token_info.access_token_duration_secs).to_header_value(),
    ] {
        response.headers_mut().append(cookies::set_cookie_name(), header);
    }
    Ok(response)
}

fn split_pair(value: &str) -> Option<(&str, &str)> {
    value.split_once(':').filter(|(a, b)| !a.is_empty() && !b.is_empty())
}
