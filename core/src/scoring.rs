//! Abuse and ROI scoring.
//!
//! Both scores are rebuilt from the profile's cumulative state on every call.
//! Nothing is carried over from the previous score, so scoring the same
//! profile twice under the same policy yields the same numbers.

use chrono::{DateTime, Utc};

use crate::clock::elapsed_secs;
use crate::policy::TenantPolicy;
use crate::profile::UserProfile;

const RATE_SIGNAL_WEIGHT: f64 = 0.4;
const REPETITION_SIGNAL_WEIGHT: f64 = 0.3;
const COST_SIGNAL_WEIGHT: f64 = 0.4;
/// Events needed (and compared) for the repetition signal.
const REPETITION_WINDOW: usize = 5;
/// Lower bound on profile age when computing the event rate, so a burst of
/// events right after creation never divides by zero.
const MIN_RATE_WINDOW_MINUTES: f64 = 0.1;

pub const SIGNAL_API_RATE: &str = "api_rate_exceeded";
pub const SIGNAL_REPETITION: &str = "repetitive_sequence";
pub const SIGNAL_SESSION_COST: &str = "session_cost_exceeded";

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    /// In [0, 1]
    pub abuse_score: f64,
    pub roi_score: f64,
    pub signals: Vec<&'static str>,
}

/// Score `user` against `tenant` without modifying anything.
pub fn assess(user: &UserProfile, tenant: &TenantPolicy, now: DateTime<Utc>) -> ScoreCard {
    let mut raw = 0.0;
    let mut signals = Vec::new();

    let minutes = (elapsed_secs(user.created_at(), now) / 60.0).max(MIN_RATE_WINDOW_MINUTES);
    let rate = user.api_event_count() as f64 / minutes;
    if rate > tenant.max_api_rate_per_minute {
        raw += RATE_SIGNAL_WEIGHT;
        signals.push(SIGNAL_API_RATE);
    }

    if is_repetitive(user.recent_event_types()) {
        raw += REPETITION_SIGNAL_WEIGHT;
        signals.push(SIGNAL_REPETITION);
    }

    if user.estimated_cost() > tenant.max_cost_per_session {
        raw += COST_SIGNAL_WEIGHT;
        signals.push(SIGNAL_SESSION_COST);
    }

    let abuse_score = f64::min(raw, 1.0);
    let roi_score = (user.feature_value() - user.estimated_cost()) * (1.0 - abuse_score);

    ScoreCard {
        abuse_score,
        roi_score,
        signals,
    }
}

/// Score `user` and store the result on the profile.
pub fn calculate(user: &mut UserProfile, tenant: &TenantPolicy, now: DateTime<Utc>) -> ScoreCard {
    let card = assess(user, tenant, now);
    user.set_scores(card.abuse_score, card.roi_score);
    card
}

fn is_repetitive(sequence: &[String]) -> bool {
    if sequence.len() < REPETITION_WINDOW {
        return false;
    }
    let tail = &sequence[sequence.len() - REPETITION_WINDOW..];
    tail.iter().all(|event_type| *event_type == tail[0])
}
