use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use trialguard_core::error::{self, ApiError, EngineError};

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
        docs_hint: Option<String>,
    },
    /// Resource not found (404)
    NotFound { resource: String },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation {
                message,
                field,
                received,
                docs_hint,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: error::codes::VALIDATION_FAILED.to_string(),
                    message,
                    field,
                    received,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                ApiError {
                    error: error::codes::NOT_FOUND.to_string(),
                    message: format!("{resource} not found"),
                    field: None,
                    received: Some(serde_json::Value::String(resource)),
                    request_id,
                    docs_hint: Some(
                        "List known tenants with GET /v1/tenants and users with GET /v1/users."
                            .to_string(),
                    ),
                },
            ),
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let field = err.field().map(str::to_string);
        match err {
            EngineError::UnknownTenant { ref tenant_id } => AppError::Validation {
                message: err.to_string(),
                field,
                received: Some(serde_json::Value::String(tenant_id.clone())),
                docs_hint: Some("Events must name a configured tenant (GET /v1/tenants).".to_string()),
            },
            EngineError::UnknownUser { user_id } => AppError::NotFound {
                resource: format!("users/{user_id}"),
            },
            EngineError::InvalidPolicyValue { value, .. } => AppError::Validation {
                message: err.to_string(),
                field,
                received: serde_json::Number::from_f64(value).map(serde_json::Value::Number),
                docs_hint: Some(
                    "max_api_rate_per_minute and max_cost_per_session must be > 0, \
                     abuse_threshold within (0, 1], weights within [0, 1]."
                        .to_string(),
                ),
            },
            EngineError::InvalidEventInput { .. } => AppError::Validation {
                message: err.to_string(),
                field,
                received: None,
                docs_hint: Some(
                    "Events need a non-empty user_id and event_type (e.g. \"API_CALL\").".to_string(),
                ),
            },
        }
    }
}

/// Map an engine error for a path-addressed tenant: an unknown tenant in the
/// URL is a missing resource rather than a bad request body.
pub fn tenant_path_error(err: EngineError) -> AppError {
    match err {
        EngineError::UnknownTenant { tenant_id } => AppError::NotFound {
            resource: format!("tenants/{tenant_id}"),
        },
        other => other.into(),
    }
}
