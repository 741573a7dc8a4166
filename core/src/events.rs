use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::decision::Decision;
use crate::profile::UserType;

/// One already-parsed usage event from a trial tenant.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsageEvent {
    /// Tenant the user belongs to; must be a configured tenant
    pub tenant_id: String,
    pub user_id: String,
    /// Free-form event tag (e.g. "LOGIN", "API_CALL", "CHECKOUT_ATTEMPT")
    pub event_type: String,
    /// Shared backend resource touched by the event, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// Classification applied when the user is first seen; ignored afterwards
    #[serde(default)]
    pub user_type: UserType,
}

/// Result of admitting one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EventOutcome {
    pub user_id: String,
    pub decision: Decision,
    pub reasons: Vec<String>,
    pub abuse_score: f64,
    pub roi_score: f64,
    /// Cost attributed to this event
    pub cost: f64,
    /// Value attributed to this event
    pub value: f64,
}

/// Events processed in order. Processing stops at the first rejected event.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchUsageEvents {
    pub events: Vec<UsageEvent>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchOutcome {
    pub outcomes: Vec<EventOutcome>,
}
