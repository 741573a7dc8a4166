use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use trialguard_core::resources::ResourceLoad;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/resources", get(list_resources))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ResourceListResponse {
    /// Every resource seen so far, ordered by id
    pub resources: Vec<ResourceLoad>,
}

/// Current load of every shared resource
///
/// Load counts accesses in the trailing 60s window as of the resource's last
/// access. Resources stay listed after their load drops to zero.
#[utoipa::path(
    get,
    path = "/v1/resources",
    responses(
        (status = 200, description = "Resource loads", body = ResourceListResponse)
    ),
    tag = "resources"
)]
pub async fn list_resources(State(state): State<AppState>) -> Json<ResourceListResponse> {
    let engine = state.engine.read().await;
    Json(ResourceListResponse {
        resources: engine.resources(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{send, state};
    use axum::http::StatusCode;
    use trialguard_core::events::UsageEvent;
    use trialguard_core::profile::UserType;

    #[tokio::test]
    async fn reports_load_and_band_per_resource() {
        let (state, _clock) = state();
        {
            let mut engine = state.engine.write().await;
            for i in 0..25 {
                engine
                    .process_event(&UsageEvent {
                        tenant_id: "Tenant_A".to_string(),
                        user_id: format!("msg_user_{i}"),
                        event_type: "VIEW_DASHBOARD".to_string(),
                        resource_id: Some("DB_SHARD_1".to_string()),
                        user_type: UserType::Normal,
                    })
                    .unwrap();
            }
        }

        let (status, body) = send(router().with_state(state), "GET", "/v1/resources", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["resources"],
            serde_json::json!([{ "resource_id": "DB_SHARD_1", "load": 25, "band": "elevated" }])
        );
    }
}
