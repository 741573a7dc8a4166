use serde::Serialize;
use utoipa::ToSchema;

/// Structured error response returned by every TrialGuard endpoint.
/// Carries enough context for a dashboard or script to show what was
/// rejected and how to fix the request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Machine-readable error code (e.g. "validation_failed", "not_found")
    pub error: String,
    /// Human-readable description of what went wrong
    pub message: String,
    /// Which field caused the error (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// The value that was received (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<serde_json::Value>,
    /// Request ID for tracing and debugging
    pub request_id: String,
    /// Hint about what the correct usage looks like
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_hint: Option<String>,
}

/// Error codes used across the API
pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const NOT_FOUND: &str = "not_found";
    pub const RATE_LIMITED: &str = "rate_limited";
}

/// Errors raised by the admission engine. Every variant rejects the whole
/// call: no registry, tracker, or counter is touched before it is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("unknown tenant '{tenant_id}'")]
    UnknownTenant { tenant_id: String },

    #[error("unknown user '{user_id}'")]
    UnknownUser { user_id: String },

    #[error("invalid value {value} for policy field '{field}': {reason}")]
    InvalidPolicyValue {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("invalid event field '{field}': {reason}")]
    InvalidEventInput {
        field: &'static str,
        reason: &'static str,
    },
}

impl EngineError {
    /// Name of the offending field, when the error is tied to one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            EngineError::UnknownTenant { .. } => Some("tenant_id"),
            EngineError::UnknownUser { .. } => Some("user_id"),
            EngineError::InvalidPolicyValue { field, .. }
            | EngineError::InvalidEventInput { field, .. } => Some(field),
        }
    }
}
