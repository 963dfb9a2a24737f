//! `/v1/service*`, `/v1/{serviceId}/jwks.json` (administrative): relying
//! service CRUD and both the public and administrative JWKS views.

use super::extract::{Validate, ValidJson};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use auth_core::models::{KeyStatus, Service};
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

fn parse_service_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::from(auth_core::CoreError::InvalidServiceId))
}

pub async fn public_jwks(State(state): State<AppState>, Path(service_id): Path<String>) -> ApiResult<Response> {
    let service_id = parse_service_id(&service_id)?;
    let keys = state.jwks.get_jwks(service_id).await?;
    let mut response = Json(keys).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=600"));
    Ok(response)
}

#[derive(Serialize)]
pub struct AdminJwksResponse {
    keys: Vec<auth_core::models::JwkPublicRecord>,
    status: HashMap<String, KeyStatus>,
}

pub async fn admin_jwks(State(state): State<AppState>, Path(service_id): Path<String>) -> ApiResult<Json<AdminJwksResponse>> {
    let service_id = parse_service_id(&service_id)?;
    let keys = state.jwks.get_jwks(service_id).await?;
    let status = state.jwks.key_status(service_id).await?;
    Ok(Json(AdminJwksResponse { keys, status }))
}

#[derive(Serialize)]
pub struct ServiceInfoResponse {
    name: String,
    contact: Option<String>,
    contact_email: Option<String>,
}

pub async fn service_info(State(state): State<AppState>, Path(service_id): Path<String>) -> ApiResult<Json<ServiceInfoResponse>> {
    let service_id = parse_service_id(&service_id)?;
    let service = state.services.get(service_id).await?;
    Ok(Json(ServiceInfoResponse {
        name: service.name,
        contact: service.contact_name,
        contact_email: service.contact_email,
    }))
}

#[derive(Deserialize)]
pub struct CreateServiceRequest {
    name: String,
    jwt_audience: String,
    api_domain: String,
    login_redirect: String,
    access_token_duration_secs: Option<i64>,
    access_token_cookie_name: Option<String>,
    description: Option<String>,
    contact_name: Option<String>,
    contact_email: Option<String>,
}

impl Validate for CreateServiceRequest {
    fn validate(&self) -> HashMap<String, String> {
        let mut problems = HashMap::new();
        for (field, value) in [
            ("name", &self.name),
            ("jwt_audience", &self.jwt_audience),
            ("api_domain", &self.api_domain),
            ("login_redirect", &self.login_redirect),
        ] {
            if value.is_empty() {
                problems.insert(field.to_string(), format!("'{field}' cannot be empty"));
            }
        }
        problems
    }
}

pub async fn create_service(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<CreateServiceRequest>,
) -> ApiResult<(StatusCode, Json<Service>)> {
    let now = chrono::Utc::now();
    let service = Service {
        id: Uuid::now_v7(),
        name: body.name,
        jwt_audience: body.jwt_audience,
        api_domain: body.api_domain,
        login_redirect: body.login_redirect,
        access_token_duration_secs: body.access_token_duration_secs.unwrap_or(3600),
        access_token_cookie_name: body.access_token_cookie_name.unwrap_or_else(|| "kuura_access".to_string()),
        description: body.description,
        contact_name: body.contact_name,
        contact_email: body.contact_email,
        created_at: now,
        modified_at: now,
    };
    state.services.create(&service).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

pub async fn list_services(State(state): State<AppState>) -> ApiResult<Json<Vec<Service>>> {
    Ok(Json(state.services.list().await?))
}
