use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::EngineError;

pub const DEFAULT_MAX_API_RATE_PER_MINUTE: f64 = 50.0;
pub const DEFAULT_MAX_COST_PER_SESSION: f64 = 10.0;
pub const DEFAULT_ABUSE_THRESHOLD: f64 = 0.7;
pub const DEFAULT_ROI_MIN_THRESHOLD: f64 = 0.0;
pub const DEFAULT_WEIGHT_ABUSE: f64 = 0.5;
pub const DEFAULT_WEIGHT_COST: f64 = 0.3;
pub const DEFAULT_WEIGHT_VALUE: f64 = 0.2;

/// Per-tenant detection thresholds.
///
/// The weights and `roi_min_threshold` are configuration surface only: they
/// are stored, validated and reported, but scoring does not read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TenantPolicy {
    pub name: String,
    /// Events per minute above which the rate signal fires
    pub max_api_rate_per_minute: f64,
    /// Cumulative estimated cost above which the cost signal fires
    pub max_cost_per_session: f64,
    /// Abuse score at or above which the abuse gate applies, in (0, 1]
    pub abuse_threshold: f64,
    pub roi_min_threshold: f64,
    pub weight_abuse: f64,
    pub weight_cost: f64,
    pub weight_value: f64,
}

impl TenantPolicy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_api_rate_per_minute: DEFAULT_MAX_API_RATE_PER_MINUTE,
            max_cost_per_session: DEFAULT_MAX_COST_PER_SESSION,
            abuse_threshold: DEFAULT_ABUSE_THRESHOLD,
            roi_min_threshold: DEFAULT_ROI_MIN_THRESHOLD,
            weight_abuse: DEFAULT_WEIGHT_ABUSE,
            weight_cost: DEFAULT_WEIGHT_COST,
            weight_value: DEFAULT_WEIGHT_VALUE,
        }
    }

    /// Build the policy that results from `update` without touching `self`.
    /// Either every supplied field is valid and the new policy is returned,
    /// or the first invalid field is reported and nothing changes.
    pub fn updated(&self, update: &TenantPolicyUpdate) -> Result<TenantPolicy, EngineError> {
        let mut next = self.clone();

        if let Some(value) = update.max_api_rate_per_minute {
            next.max_api_rate_per_minute = positive("max_api_rate_per_minute", value)?;
        }
        if let Some(value) = update.max_cost_per_session {
            next.max_cost_per_session = positive("max_cost_per_session", value)?;
        }
        if let Some(value) = update.abuse_threshold {
            next.abuse_threshold = threshold("abuse_threshold", value)?;
        }
        if let Some(value) = update.roi_min_threshold {
            next.roi_min_threshold = finite("roi_min_threshold", value)?;
        }
        if let Some(value) = update.weight_abuse {
            next.weight_abuse = weight("weight_abuse", value)?;
        }
        if let Some(value) = update.weight_cost {
            next.weight_cost = weight("weight_cost", value)?;
        }
        if let Some(value) = update.weight_value {
            next.weight_value = weight("weight_value", value)?;
        }

        Ok(next)
    }
}

/// Partial update of a tenant policy. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct TenantPolicyUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_api_rate_per_minute: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cost_per_session: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abuse_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roi_min_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_abuse: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_value: Option<f64>,
}

impl TenantPolicyUpdate {
    pub fn is_empty(&self) -> bool {
        self.max_api_rate_per_minute.is_none()
            && self.max_cost_per_session.is_none()
            && self.abuse_threshold.is_none()
            && self.roi_min_threshold.is_none()
            && self.weight_abuse.is_none()
            && self.weight_cost.is_none()
            && self.weight_value.is_none()
    }
}

fn finite(field: &'static str, value: f64) -> Result<f64, EngineError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EngineError::InvalidPolicyValue {
            field,
            value,
            reason: "must be a finite number",
        })
    }
}

fn positive(field: &'static str, value: f64) -> Result<f64, EngineError> {
    let value = finite(field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(EngineError::InvalidPolicyValue {
            field,
            value,
            reason: "must be greater than 0",
        })
    }
}

fn threshold(field: &'static str, value: f64) -> Result<f64, EngineError> {
    let value = finite(field, value)?;
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(EngineError::InvalidPolicyValue {
            field,
            value,
            reason: "must be within (0, 1]",
        })
    }
}

fn weight(field: &'static str, value: f64) -> Result<f64, EngineError> {
    let value = finite(field, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(EngineError::InvalidPolicyValue {
            field,
            value,
            reason: "must be within [0, 1]",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_policy_uses_defaults() {
        let policy = TenantPolicy::new("Tenant_A");
        assert_eq!(policy.max_api_rate_per_minute, 50.0);
        assert_eq!(policy.max_cost_per_session, 10.0);
        assert_eq!(policy.abuse_threshold, 0.7);
        assert_eq!(policy.weight_value, 0.2);
    }

    #[test]
    fn partial_update_leaves_other_fields_alone() {
        let policy = TenantPolicy::new("Tenant_A");
        let update = TenantPolicyUpdate {
            abuse_threshold: Some(0.5),
            weight_cost: Some(0.6),
            ..Default::default()
        };
        let next = policy.updated(&update).unwrap();
        assert_eq!(next.abuse_threshold, 0.5);
        assert_eq!(next.weight_cost, 0.6);
        assert_eq!(next.weight_value, DEFAULT_WEIGHT_VALUE);
        assert_eq!(next.max_api_rate_per_minute, policy.max_api_rate_per_minute);
    }

    #[test]
    fn abuse_threshold_must_be_in_half_open_unit_interval() {
        let policy = TenantPolicy::new("Tenant_A");
        for bad in [0.0, -0.1, 1.01, f64::NAN] {
            let update = TenantPolicyUpdate {
                abuse_threshold: Some(bad),
                ..Default::default()
            };
            let err = policy.updated(&update).unwrap_err();
            assert_eq!(err.field(), Some("abuse_threshold"));
        }
        let update = TenantPolicyUpdate {
            abuse_threshold: Some(1.0),
            ..Default::default()
        };
        assert!(policy.updated(&update).is_ok());
    }

    #[test]
    fn rate_limit_must_be_positive() {
        let policy = TenantPolicy::new("Tenant_A");
        let update = TenantPolicyUpdate {
            max_api_rate_per_minute: Some(0.0),
            ..Default::default()
        };
        assert!(matches!(
            policy.updated(&update),
            Err(EngineError::InvalidPolicyValue {
                field: "max_api_rate_per_minute",
                ..
            })
        ));
    }

    #[test]
    fn update_rejects_unknown_fields() {
        let parsed: Result<TenantPolicyUpdate, _> =
            serde_json::from_str(r#"{"abuse_threshold": 0.5, "bogus": 1}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(TenantPolicyUpdate::default().is_empty());
        let update = TenantPolicyUpdate {
            weight_value: Some(0.1),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
