//! `/v1/m2m/*`: machine-to-machine session creation (management listener)
//! and access-token refresh (main listener).

use super::extract::{Validate, ValidJson};
use crate::error::ApiResult;
use crate::http::users::TokenInfoResponse;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct CreateM2mSessionRequest {
    subject_id: String,
    template: String,
    service_id: String,
}

impl Validate for CreateM2mSessionRequest {
    fn validate(&self) -> HashMap<String, String> {
        let mut problems = HashMap::new();
        if self.subject_id.is_empty() {
            problems.insert("subject_id".into(), "'subject_id' cannot be empty".into());
        }
        if self.template.is_empty() {
            problems.insert("template".into(), "'template' cannot be empty".into());
        }
        if self.service_id.is_empty() {
            problems.insert("service_id".into(), "'service_id' cannot be empty".into());
        } else if Uuid::parse_str(&self.service_id).is_err() {
            problems.insert("service_id".into(), "'service_id' must be a valid UUID".into());
        }
        problems
    }
}

#[derive(Serialize)]
pub struct CreateM2mSessionResponse {
    session_id: String,
    token: String,
}

pub async fn create_session(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<CreateM2mSessionRequest>,
) -> ApiResult<(StatusCode, Json<CreateM2mSessionResponse>)> {
    let service_id = Uuid::parse_str(&body.service_id).map_err(|_| auth_core::CoreError::InvalidServiceId)?;
    let (session_id, token) = state.m2m.create_m2m_session(service_id, &body.subject_id, &body.template).await?;
    Ok((StatusCode::CREATED, Json(CreateM2mSessionResponse { session_id, token })))
}

#[derive(Deserialize)]
pub struct M2mRefreshRequest {
    session_id: String,
    refresh_token: String,
}

impl Validate for M2mRefreshRequest {
    fn validate(&self) -> HashMap<String, String> {
        let mut problems = HashMap::new();
        if self.session_id.is_empty() {
            problems.insert("session_id".into(), "'session_id' cannot be empty".into());
        }
        if self.refresh_token.is_empty() {
            problems.insert("refresh_token".into(), "'refresh_token' cannot be empty".into());
        }
        problems
    }
}

pub async fn refresh_access(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<M2mRefreshRequest>,
) -> ApiResult<Json<TokenInfoResponse>> {
    let token_info = state.m2m.refresh_access_token(&body.session_id, &body.refresh_token).await?;
    Ok(Json(token_info.into()))
}
