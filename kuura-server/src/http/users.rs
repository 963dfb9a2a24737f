//! `/v1/user/*`, `/v1/logout`, `/v1/me`: the user-facing token lifecycle
//! once a session already exists (minted by `srp::verify`).

use super::extract::{Validate, ValidJson};
use crate::cookies;
use crate::error::{missing_cookie, ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Serialize)]
pub struct SuccessResponse {
    success: bool,
}

pub async fn refresh_internal(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let session_id =
        cookies::read_cookie(&headers, cookies::SESSION_COOKIE).ok_or_else(|| missing_cookie(cookies::SESSION_COOKIE))?;
    let refresh_token =
        cookies::read_cookie(&headers, cookies::REFRESH_COOKIE).ok_or_else(|| missing_cookie(cookies::REFRESH_COOKIE))?;

    let token_info = state.tokens.create_access_token(&session_id, &refresh_token).await?;

    let mut response = Json(SuccessResponse { success: true }).into_response();
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

#[derive(Deserialize)]
pub struct ExchangeExternalRequest {
    code: Option<String>,
    session_id: Option<String>,
    refresh_token: Option<String>,
}

impl Validate for ExchangeExternalRequest {
    fn validate(&self) -> HashMap<String, String> {
        let mut problems = HashMap::new();
        let has_code = self.code.as_deref().is_some_and(|c| !c.is_empty());
        let has_refresh = self.session_id.as_deref().is_some_and(|s| !s.is_empty())
            && self.refresh_token.as_deref().is_some_and(|r| !r.is_empty());
        if !has_code && !has_refresh {
            problems.insert(
                "code".into(),
                "either 'code' or both 'session_id' and 'refresh_token' are required".into(),
            );
        }
        problems
    }
}

#[derive(Serialize)]
pub struct TokenInfoResponse {
    access_token: String,
    refresh_token: String,
    session_id: String,
    expires_in: i64,
}

impl From<auth_core::models::TokenInfo> for TokenInfoResponse {
    fn from(info: auth_core::models::TokenInfo) -> Self {
        Self {
            access_token: info.access_token,
            refresh_token: info.refresh_token,
            session_id: info.session_id,
            expires_in: info.access_token_duration_secs,
        }
    }
}

pub async fn exchange_external(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<ExchangeExternalRequest>,
) -> ApiResult<Json<TokenInfoResponse>> {
    let token_info = match body.code {
        Some(code) => state.tokens.exchange_code(&code).await?,
        None => {
            let session_id = body.session_id.unwrap_or_default();
            let refresh_token = body.refresh_token.unwrap_or_default();
            state.tokens.create_access_token(&session_id, &refresh_token).await?
        }
    };
    Ok(Json(token_info.into()))
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    if let Some(session_id) = cookies::read_cookie(&headers, cookies::SESSION_COOKIE) {
        state.tokens.invalidate_session(&session_id).await?;
    }

    let mut response = Json(SuccessResponse { success: true }).into_response();
    for header in cookies::clear_cookies(&state.settings.public_kuura_domain) {
        response.headers_mut().append(cookies::set_cookie_name(), header);
    }
    Ok(response)
}

#[derive(Serialize)]
pub struct MeResponse {
    id: Uuid,
    username: String,
    last_login_at: Option<chrono::DateTime<chrono::Utc>>,
}

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<MeResponse>> {
    let access_token =
        cookies::read_cookie(&headers, cookies::ACCESS_COOKIE).ok_or_else(|| missing_cookie(cookies::ACCESS_COOKIE))?;

    let claims = state.tokens.verify_access_token(state.internal_service_id, &access_token).await?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::from(auth_core::CoreError::Unauthorized))?;
    let user = state.tokens.get_user_profile(user_id).await?;

    Ok(Json(MeResponse { id: user.id, username: user.username, last_login_at: user.last_login_at }))
}
