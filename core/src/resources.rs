use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Trailing window over which resource accesses count towards load.
pub const LOAD_WINDOW_SECS: i64 = 60;
/// Load above which a resource is reported as elevated.
pub const ELEVATED_LOAD: usize = 20;
/// Load above which a resource is reported as hot. Hot resources also double
/// the synthetic cost of events that touch them.
pub const HIGH_LOAD: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoadBand {
    Normal,
    Elevated,
    High,
}

impl LoadBand {
    pub fn for_load(load: usize) -> Self {
        if load > HIGH_LOAD {
            LoadBand::High
        } else if load > ELEVATED_LOAD {
            LoadBand::Elevated
        } else {
            LoadBand::Normal
        }
    }
}

/// Current load of one shared resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ResourceLoad {
    pub resource_id: String,
    /// Accesses retained in the trailing 60s window
    pub load: usize,
    pub band: LoadBand,
}

/// Sliding-window access counter per shared resource, used to spot fan-in
/// and resource drain.
#[derive(Debug, Default)]
pub struct ResourceLoadTracker {
    usage: BTreeMap<String, VecDeque<DateTime<Utc>>>,
}

impl ResourceLoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an access at `now`, then drop every access that is a full
    /// window old relative to `now`.
    pub fn log_usage(&mut self, resource_id: &str, now: DateTime<Utc>) {
        let window = Duration::seconds(LOAD_WINDOW_SECS);
        let accesses = self.usage.entry(resource_id.to_string()).or_default();
        accesses.push_back(now);
        accesses.retain(|at| now.signed_duration_since(*at) < window);
    }

    /// Accesses retained for `resource_id` as of its last `log_usage`.
    /// Unknown resources have zero load.
    pub fn load(&self, resource_id: &str) -> usize {
        self.usage.get(resource_id).map_or(0, VecDeque::len)
    }

    pub fn snapshot(&self) -> Vec<ResourceLoad> {
        self.usage
            .iter()
            .map(|(resource_id, accesses)| ResourceLoad {
                resource_id: resource_id.clone(),
                load: accesses.len(),
                band: LoadBand::for_load(accesses.len()),
            })
            .collect()
    }
}
