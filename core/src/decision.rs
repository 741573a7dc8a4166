use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::policy::TenantPolicy;
use crate::profile::UserProfile;
use crate::resources::ResourceLoadTracker;

/// Inside the abuse gate, ROI below this blocks with the critical reasons.
const CRITICAL_NEGATIVE_ROI: f64 = -5.0;
/// Inside the abuse gate, ROI above this throttles instead of blocking.
const HIGH_VALUE_ROI: f64 = 5.0;
/// Load on the user's last resource above which the event is throttled.
const OVERLOADED_RESOURCE_LOAD: usize = 100;
const SALES_MIN_ROI: f64 = 10.0;
const SALES_MAX_ABUSE: f64 = 0.2;

/// Admission-control verdict for an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    #[default]
    Allow,
    Throttle,
    Block,
    FlagSales,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Allow => "ALLOW",
            Decision::Throttle => "THROTTLE",
            Decision::Block => "BLOCK",
            Decision::FlagSales => "FLAG_SALES",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub decision: Decision,
    pub reasons: Vec<String>,
}

impl Verdict {
    fn new(decision: Decision, reasons: Vec<String>) -> Self {
        Self { decision, reasons }
    }
}

/// Map the user's current scores onto a decision.
///
/// Rules are a strict priority chain and the first match wins:
/// abuse gate, then resource drain, then sales opportunity, then allow.
pub fn decide(
    user: &UserProfile,
    tenant: &TenantPolicy,
    resources: &ResourceLoadTracker,
) -> Verdict {
    let abuse = user.abuse_score();
    let roi = user.roi_score();

    if abuse >= tenant.abuse_threshold {
        if roi < CRITICAL_NEGATIVE_ROI {
            return Verdict::new(
                Decision::Block,
                vec![
                    format!("Critical Abuse Score ({abuse:.2})"),
                    format!("Negative ROI ({roi:.2})"),
                ],
            );
        }
        if roi > HIGH_VALUE_ROI {
            return Verdict::new(
                Decision::Throttle,
                vec!["High Volume but High Value".to_string()],
            );
        }
        return Verdict::new(Decision::Block, vec!["Abuse Threshold Exceeded".to_string()]);
    }

    if let Some(resource_id) = user
        .last_event()
        .and_then(|event| event.resource_id.as_deref())
        && resources.load(resource_id) > OVERLOADED_RESOURCE_LOAD
    {
        return Verdict::new(
            Decision::Throttle,
            vec![format!("Resource {resource_id} Overloaded")],
        );
    }

    if roi > SALES_MIN_ROI && abuse < SALES_MAX_ABUSE {
        return Verdict::new(Decision::FlagSales, vec!["High ROI User".to_string()]);
    }

    Verdict::new(Decision::Allow, vec!["Normal Behavior".to_string()])
}
