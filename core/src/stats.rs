use serde::Serialize;
use utoipa::ToSchema;

use crate::decision::Decision;
use crate::pricing::EventPrice;

/// Share of a flagged event's value counted as recoverable revenue.
const SALES_CONVERSION_SHARE: f64 = 0.1;

/// Process-wide counters, updated once per processed event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateStats {
    pub total_events: u64,
    pub blocked_events: u64,
    /// Cost of every blocked event
    pub cost_saved: f64,
    /// 10% of the value of every event flagged for sales
    pub revenue_saved: f64,
}

impl AggregateStats {
    pub fn record(&mut self, decision: Decision, price: EventPrice) {
        self.total_events += 1;
        match decision {
            Decision::Block => {
                self.blocked_events += 1;
                self.cost_saved += price.cost;
            }
            Decision::FlagSales => {
                self.revenue_saved += price.value * SALES_CONVERSION_SHARE;
            }
            Decision::Allow | Decision::Throttle => {}
        }
    }

    pub fn block_rate_percent(&self) -> f64 {
        if self.total_events == 0 {
            0.0
        } else {
            self.blocked_events as f64 / self.total_events as f64 * 100.0
        }
    }

    pub fn snapshot(&self, active_trials: usize) -> StatsSnapshot {
        StatsSnapshot {
            total_events: self.total_events,
            blocked_events: self.blocked_events,
            cost_saved: self.cost_saved,
            revenue_saved: self.revenue_saved,
            block_rate_percent: self.block_rate_percent(),
            active_trials,
        }
    }
}

/// Aggregate counters plus the metrics a dashboard derives from them.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StatsSnapshot {
    pub total_events: u64,
    pub blocked_events: u64,
    pub cost_saved: f64,
    pub revenue_saved: f64,
    pub block_rate_percent: f64,
    /// Number of known trial users
    pub active_trials: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_counts_cost_and_sales_count_a_tenth_of_value() {
        let mut stats = AggregateStats::default();
        stats.record(Decision::Block, EventPrice { cost: 0.4, value: 0.1 });
        stats.record(Decision::FlagSales, EventPrice { cost: 0.05, value: 2.0 });
        stats.record(Decision::Allow, EventPrice { cost: 0.3, value: 0.1 });
        stats.record(Decision::Throttle, EventPrice { cost: 0.3, value: 0.1 });

        assert_eq!(stats.total_events, 4);
        assert_eq!(stats.blocked_events, 1);
        assert_eq!(stats.cost_saved, 0.4);
        assert!((stats.revenue_saved - 0.2).abs() < 1e-9);
        assert_eq!(stats.block_rate_percent(), 25.0);
    }

    #[test]
    fn empty_stats_have_zero_block_rate() {
        let snapshot = AggregateStats::default().snapshot(0);
        assert_eq!(snapshot.block_rate_percent, 0.0);
        assert_eq!(snapshot.active_trials, 0);
    }
}
