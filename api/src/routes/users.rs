use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use trialguard_core::error::ApiError;
use trialguard_core::profile::UserProfile;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/users", get(list_users))
        .route("/v1/users/{user_id}", get(get_user))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserListResponse {
    /// Most recently active first
    pub users: Vec<UserProfile>,
}

/// List every tracked trial user with its fingerprint, scores and decision
#[utoipa::path(
    get,
    path = "/v1/users",
    responses(
        (status = 200, description = "Tracked users", body = UserListResponse)
    ),
    tag = "users"
)]
pub async fn list_users(State(state): State<AppState>) -> Json<UserListResponse> {
    let engine = state.engine.read().await;
    Json(UserListResponse {
        users: engine.users().into_iter().cloned().collect(),
    })
}

/// Get one trial user's profile
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}",
    params(("user_id" = String, Path, description = "Trial user id")),
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 404, description = "User has never sent an event", body = ApiError)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    let engine = state.engine.read().await;
    let user = engine.user(&user_id)?;
    Ok(Json(user.clone()))
}
