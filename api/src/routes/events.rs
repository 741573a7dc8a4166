use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use trialguard_core::error::ApiError;
use trialguard_core::events::{BatchOutcome, BatchUsageEvents, EventOutcome, UsageEvent};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

const MAX_BATCH_SIZE: usize = 500;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/events", post(process_event))
        .route("/v1/events/batch", post(process_events_batch))
}

/// Admit one usage event
///
/// Updates the user's behavioral fingerprint, rescores it and returns the
/// admission decision with its reasons. Unknown tenants are rejected without
/// creating any state.
#[utoipa::path(
    post,
    path = "/v1/events",
    request_body = UsageEvent,
    responses(
        (status = 200, description = "Event admitted and decided", body = EventOutcome),
        (status = 400, description = "Invalid event or unknown tenant", body = ApiError),
        (status = 429, description = "Rate limited", body = ApiError)
    ),
    tag = "events"
)]
pub async fn process_event(
    State(state): State<AppState>,
    AppJson(event): AppJson<UsageEvent>,
) -> Result<Json<EventOutcome>, AppError> {
    let outcome = state.engine.write().await.process_event(&event)?;
    Ok(Json(outcome))
}

/// Admit several usage events in order
///
/// Events are processed one after another under a single engine lock.
/// Processing stops at the first rejected event; events before it stay
/// applied and the error reports how many that was.
#[utoipa::path(
    post,
    path = "/v1/events/batch",
    request_body = BatchUsageEvents,
    responses(
        (status = 200, description = "All events admitted", body = BatchOutcome),
        (status = 400, description = "An event was rejected", body = ApiError),
        (status = 429, description = "Rate limited", body = ApiError)
    ),
    tag = "events"
)]
pub async fn process_events_batch(
    State(state): State<AppState>,
    AppJson(batch): AppJson<BatchUsageEvents>,
) -> Result<Json<BatchOutcome>, AppError> {
    if batch.events.is_empty() || batch.events.len() > MAX_BATCH_SIZE {
        return Err(AppError::Validation {
            message: format!(
                "events must contain between 1 and {MAX_BATCH_SIZE} entries, got {}",
                batch.events.len()
            ),
            field: Some("events".to_string()),
            received: Some(serde_json::json!(batch.events.len())),
            docs_hint: Some("Split large batches into several requests.".to_string()),
        });
    }

    let mut engine = state.engine.write().await;
    let mut outcomes = Vec::with_capacity(batch.events.len());
    for (index, event) in batch.events.iter().enumerate() {
        match engine.process_event(event) {
            Ok(outcome) => outcomes.push(outcome),
            Err(err) => {
                tracing::warn!(index, applied = outcomes.len(), error = %err, "batch stopped at rejected event");
                return Err(batch_rejection(index, err.into()));
            }
        }
    }

    Ok(Json(BatchOutcome { outcomes }))
}

fn batch_rejection(index: usize, err: AppError) -> AppError {
    match err {
        AppError::Validation {
            message,
            field,
            received,
            docs_hint,
        } => AppError::Validation {
            message: format!("events[{index}]: {message} ({index} earlier events were applied)"),
            field: field.map(|f| format!("events[{index}].{f}")),
            received,
            docs_hint,
        },
        other => other,
    }
}
