use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use trialguard_core::stats::StatsSnapshot;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/stats", get(get_stats))
}

/// Aggregate admission counters
///
/// Totals since process start, plus the block rate and number of tracked
/// trial users.
#[utoipa::path(
    get,
    path = "/v1/stats",
    responses(
        (status = 200, description = "Aggregate statistics", body = StatsSnapshot)
    ),
    tag = "stats"
)]
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.engine.read().await.stats())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{send, state};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn fresh_engine_has_zeroed_stats() {
        let (state, _clock) = state();
        let (status, body) = send(router().with_state(state), "GET", "/v1/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_events"], 0);
        assert_eq!(body["blocked_events"], 0);
        assert_eq!(body["block_rate_percent"], 0.0);
        assert_eq!(body["active_trials"], 0);
    }
}
