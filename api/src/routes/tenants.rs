use axum::extract::{Path, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Serialize;
use trialguard_core::error::ApiError;
use trialguard_core::policy::{TenantPolicy, TenantPolicyUpdate};

use crate::error::{AppError, tenant_path_error};
use crate::extract::AppJson;
use crate::state::AppState;

pub fn read_router() -> Router<AppState> {
    Router::new()
        .route("/v1/tenants", get(list_tenants))
        .route("/v1/tenants/{tenant_id}", get(get_tenant))
}

pub fn write_router() -> Router<AppState> {
    Router::new().route("/v1/tenants/{tenant_id}", patch(update_tenant))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TenantListResponse {
    pub tenants: Vec<TenantPolicy>,
}

/// List tenant policies
#[utoipa::path(
    get,
    path = "/v1/tenants",
    responses(
        (status = 200, description = "Configured tenants, ordered by name", body = TenantListResponse)
    ),
    tag = "tenants"
)]
pub async fn list_tenants(State(state): State<AppState>) -> Json<TenantListResponse> {
    let engine = state.engine.read().await;
    Json(TenantListResponse {
        tenants: engine.tenants().into_iter().cloned().collect(),
    })
}

/// Get one tenant policy
#[utoipa::path(
    get,
    path = "/v1/tenants/{tenant_id}",
    params(("tenant_id" = String, Path, description = "Tenant name")),
    responses(
        (status = 200, description = "Tenant policy", body = TenantPolicy),
        (status = 404, description = "Unknown tenant", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn get_tenant(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<Json<TenantPolicy>, AppError> {
    let engine = state.engine.read().await;
    let policy = engine.tenant(&tenant_id).map_err(tenant_path_error)?;
    Ok(Json(policy.clone()))
}

/// Partially update a tenant policy
///
/// Only the supplied fields change. The update is validated as a whole: if
/// any field is out of range nothing is applied.
#[utoipa::path(
    patch,
    path = "/v1/tenants/{tenant_id}",
    params(("tenant_id" = String, Path, description = "Tenant name")),
    request_body = TenantPolicyUpdate,
    responses(
        (status = 200, description = "Updated policy", body = TenantPolicy),
        (status = 400, description = "Out-of-range or empty update", body = ApiError),
        (status = 404, description = "Unknown tenant", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn update_tenant(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    AppJson(update): AppJson<TenantPolicyUpdate>,
) -> Result<Json<TenantPolicy>, AppError> {
    if update.is_empty() {
        return Err(AppError::Validation {
            message: "Policy update contains no fields".to_string(),
            field: Some("body".to_string()),
            received: Some(serde_json::json!({})),
            docs_hint: Some(
                "Send at least one of max_api_rate_per_minute, max_cost_per_session, \
                 abuse_threshold, roi_min_threshold, weight_abuse, weight_cost, weight_value."
                    .to_string(),
            ),
        });
    }

    let policy = state
        .engine
        .write()
        .await
        .update_tenant_policy(&tenant_id, &update)
        .map_err(tenant_path_error)?;
    Ok(Json(policy))
}
