use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::clock::elapsed_secs;
use crate::decision::Decision;

/// How many event types the behavioral fingerprint keeps.
pub const RECENT_EVENT_TYPES: usize = 10;
/// How many raw events are retained per user. Only the latest one is read by
/// the decision rules; the rest are kept for inspection.
pub const EVENT_LOG_CAPACITY: usize = 50;
/// Inactivity gap after which the next event opens a new session.
pub const SESSION_GAP_SECS: f64 = 300.0;

/// Caller-supplied classification of a trial user. Informational only:
/// scoring never looks at it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    #[default]
    Normal,
    Abusive,
    HighValue,
}

impl UserType {
    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Normal => "NORMAL",
            UserType::Abusive => "ABUSIVE",
            UserType::HighValue => "HIGH_VALUE",
        }
    }
}

/// A single usage event as retained on the profile.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RecordedEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
}

/// Rolling behavioral, cost and value state of one trial user.
///
/// Counters and sequences only change through [`UserProfile::add_event`];
/// scores and the decision are written back by the engine after each event.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfile {
    tenant_id: String,
    user_id: String,
    user_type: UserType,
    created_at: DateTime<Utc>,
    last_active_at: DateTime<Utc>,
    api_event_count: u64,
    /// Most recent event types, oldest first
    recent_event_types: Vec<String>,
    /// Accumulated seconds per session, oldest first
    session_durations: Vec<f64>,
    estimated_cost: f64,
    feature_value: f64,
    abuse_score: f64,
    roi_score: f64,
    current_decision: Decision,
    reasons: Vec<String>,
    /// Most recent raw events, oldest first
    recent_events: Vec<RecordedEvent>,
}

impl UserProfile {
    pub fn new(
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
        user_type: UserType,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user_id: user_id.into(),
            user_type,
            created_at: now,
            last_active_at: now,
            api_event_count: 0,
            recent_event_types: Vec::with_capacity(RECENT_EVENT_TYPES + 1),
            session_durations: Vec::new(),
            estimated_cost: 0.0,
            feature_value: 0.0,
            abuse_score: 0.0,
            roi_score: 0.0,
            current_decision: Decision::Allow,
            reasons: Vec::new(),
            recent_events: Vec::new(),
        }
    }

    /// Fold one event into the fingerprint. Never fails.
    pub fn add_event(
        &mut self,
        event_type: &str,
        resource_id: Option<&str>,
        cost: f64,
        value: f64,
        now: DateTime<Utc>,
    ) {
        self.recent_events.push(RecordedEvent {
            timestamp: now,
            event_type: event_type.to_string(),
            resource_id: resource_id.map(str::to_string),
        });
        if self.recent_events.len() > EVENT_LOG_CAPACITY {
            let overflow = self.recent_events.len() - EVENT_LOG_CAPACITY;
            self.recent_events.drain(..overflow);
        }

        self.api_event_count += 1;
        self.recent_event_types.push(event_type.to_string());
        if self.recent_event_types.len() > RECENT_EVENT_TYPES {
            self.recent_event_types.remove(0);
        }

        let gap = elapsed_secs(self.last_active_at, now);
        if gap > SESSION_GAP_SECS {
            self.session_durations.push(0.0);
        } else if let Some(current) = self.session_durations.last_mut() {
            *current += gap;
        }

        if now > self.last_active_at {
            self.last_active_at = now;
        }

        self.estimated_cost += cost;
        self.feature_value += value;
    }

    pub(crate) fn set_scores(&mut self, abuse_score: f64, roi_score: f64) {
        self.abuse_score = abuse_score;
        self.roi_score = roi_score;
    }

    pub(crate) fn set_decision(&mut self, decision: Decision, reasons: Vec<String>) {
        self.current_decision = decision;
        self.reasons = reasons;
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn user_type(&self) -> UserType {
        self.user_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_active_at(&self) -> DateTime<Utc> {
        self.last_active_at
    }

    pub fn api_event_count(&self) -> u64 {
        self.api_event_count
    }

    pub fn recent_event_types(&self) -> &[String] {
        &self.recent_event_types
    }

    pub fn session_durations(&self) -> &[f64] {
        &self.session_durations
    }

    pub fn estimated_cost(&self) -> f64 {
        self.estimated_cost
    }

    pub fn feature_value(&self) -> f64 {
        self.feature_value
    }

    pub fn abuse_score(&self) -> f64 {
        self.abuse_score
    }

    pub fn roi_score(&self) -> f64 {
        self.roi_score
    }

    pub fn current_decision(&self) -> Decision {
        self.current_decision
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    pub fn recent_events(&self) -> &[RecordedEvent] {
        &self.recent_events
    }

    pub fn last_event(&self) -> Option<&RecordedEvent> {
        self.recent_events.last()
    }
}
