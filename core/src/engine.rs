use std::collections::{BTreeMap, HashMap};

use crate::clock::{Clock, SystemClock};
use crate::decision::{self, Decision};
use crate::error::EngineError;
use crate::events::{EventOutcome, UsageEvent};
use crate::policy::{TenantPolicy, TenantPolicyUpdate};
use crate::pricing::{PricingModel, SyntheticPricing};
use crate::profile::UserProfile;
use crate::resources::{ResourceLoad, ResourceLoadTracker};
use crate::scoring;
use crate::stats::{AggregateStats, StatsSnapshot};

/// Owns every registry the admission pipeline reads or writes: tenant
/// policies, user profiles, the resource tracker and the aggregate counters.
///
/// Construct once at startup and share it explicitly. Mutating calls take
/// `&mut self`, so a caller sharing the engine across tasks must serialize
/// them (the API wraps it in a `RwLock`), which keeps each event's
/// read-modify-write on a profile and a resource atomic.
pub struct AdmissionEngine {
    tenants: BTreeMap<String, TenantPolicy>,
    users: HashMap<String, UserProfile>,
    resources: ResourceLoadTracker,
    stats: AggregateStats,
    clock: Box<dyn Clock>,
    pricing: Box<dyn PricingModel>,
}

impl AdmissionEngine {
    /// Engine with a default policy for each named tenant, the system clock
    /// and synthetic pricing.
    pub fn new<I, S>(tenant_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tenants = tenant_names
            .into_iter()
            .map(|name| {
                let policy = TenantPolicy::new(name);
                (policy.name.clone(), policy)
            })
            .collect();

        Self {
            tenants,
            users: HashMap::new(),
            resources: ResourceLoadTracker::new(),
            stats: AggregateStats::default(),
            clock: Box::new(SystemClock),
            pricing: Box::new(SyntheticPricing::new()),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_pricing(mut self, pricing: impl PricingModel + 'static) -> Self {
        self.pricing = Box::new(pricing);
        self
    }

    /// Admit one usage event: update the user's fingerprint, rescore it,
    /// decide, and account for the decision.
    ///
    /// Input validation and the tenant lookup happen before any state is
    /// touched, so a rejected event leaves the engine unchanged.
    pub fn process_event(&mut self, event: &UsageEvent) -> Result<EventOutcome, EngineError> {
        validate_event(event)?;
        let tenant = self
            .tenants
            .get(&event.tenant_id)
            .ok_or_else(|| EngineError::UnknownTenant {
                tenant_id: event.tenant_id.clone(),
            })?;

        let now = self.clock.now();
        let user = self.users.entry(event.user_id.clone()).or_insert_with(|| {
            tracing::debug!(
                user_id = %event.user_id,
                tenant_id = %event.tenant_id,
                user_type = event.user_type.as_str(),
                "tracking new trial user"
            );
            UserProfile::new(&event.tenant_id, &event.user_id, event.user_type, now)
        });

        let resource_id = event.resource_id.as_deref().filter(|id| !id.is_empty());
        let resource_load = resource_id.map(|id| {
            self.resources.log_usage(id, now);
            self.resources.load(id)
        });
        let price = self.pricing.price(&event.event_type, resource_load);

        user.add_event(&event.event_type, resource_id, price.cost, price.value, now);
        let card = scoring::calculate(user, tenant, now);
        let verdict = decision::decide(user, tenant, &self.resources);
        user.set_decision(verdict.decision, verdict.reasons.clone());
        self.stats.record(verdict.decision, price);

        match verdict.decision {
            Decision::Block | Decision::Throttle => tracing::info!(
                user_id = %event.user_id,
                tenant_id = %event.tenant_id,
                decision = %verdict.decision,
                abuse_score = card.abuse_score,
                roi_score = card.roi_score,
                signals = ?card.signals,
                reasons = ?verdict.reasons,
                "trial event restricted"
            ),
            Decision::Allow | Decision::FlagSales => tracing::debug!(
                user_id = %event.user_id,
                tenant_id = %event.tenant_id,
                decision = %verdict.decision,
                abuse_score = card.abuse_score,
                roi_score = card.roi_score,
                "trial event admitted"
            ),
        }

        Ok(EventOutcome {
            user_id: event.user_id.clone(),
            decision: verdict.decision,
            reasons: verdict.reasons,
            abuse_score: card.abuse_score,
            roi_score: card.roi_score,
            cost: price.cost,
            value: price.value,
        })
    }

    /// Apply a partial policy update. Every supplied field is validated
    /// before the stored policy is replaced.
    pub fn update_tenant_policy(
        &mut self,
        tenant_id: &str,
        update: &TenantPolicyUpdate,
    ) -> Result<TenantPolicy, EngineError> {
        let current = self
            .tenants
            .get_mut(tenant_id)
            .ok_or_else(|| EngineError::UnknownTenant {
                tenant_id: tenant_id.to_string(),
            })?;
        let next = current.updated(update)?;
        *current = next.clone();

        tracing::info!(tenant_id, policy = ?next, "tenant policy updated");
        Ok(next)
    }

    /// All known users, most recently active first.
    pub fn users(&self) -> Vec<&UserProfile> {
        let mut users: Vec<&UserProfile> = self.users.values().collect();
        users.sort_by(|a, b| {
            b.last_active_at()
                .cmp(&a.last_active_at())
                .then_with(|| a.user_id().cmp(b.user_id()))
        });
        users
    }

    pub fn user(&self, user_id: &str) -> Result<&UserProfile, EngineError> {
        self.users
            .get(user_id)
            .ok_or_else(|| EngineError::UnknownUser {
                user_id: user_id.to_string(),
            })
    }

    /// All configured tenants, ordered by name.
    pub fn tenants(&self) -> Vec<&TenantPolicy> {
        self.tenants.values().collect()
    }

    pub fn tenant(&self, tenant_id: &str) -> Result<&TenantPolicy, EngineError> {
        self.tenants
            .get(tenant_id)
            .ok_or_else(|| EngineError::UnknownTenant {
                tenant_id: tenant_id.to_string(),
            })
    }

    pub fn resources(&self) -> Vec<ResourceLoad> {
        self.resources.snapshot()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.users.len())
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

fn validate_event(event: &UsageEvent) -> Result<(), EngineError> {
    if event.event_type.trim().is_empty() {
        return Err(EngineError::InvalidEventInput {
            field: "event_type",
            reason: "must not be empty",
        });
    }
    if event.user_id.trim().is_empty() {
        return Err(EngineError::InvalidEventInput {
            field: "user_id",
            reason: "must not be empty",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::pricing::EventPrice;
    use crate::profile::UserType;
    use chrono::{Duration, Utc};

    /// Fixed per-event price; a multiplier on the cost lets tests see the
    /// hot-resource surcharge.
    struct FlatPricing {
        cost: f64,
        value: f64,
    }

    impl PricingModel for FlatPricing {
        fn price(&mut self, _event_type: &str, resource_load: Option<usize>) -> EventPrice {
            let hot = resource_load.is_some_and(|load| load > 50);
            EventPrice {
                cost: if hot { self.cost * 2.0 } else { self.cost },
                value: self.value,
            }
        }
    }

    fn event(user_id: &str, event_type: &str, resource_id: Option<&str>) -> UsageEvent {
        UsageEvent {
            tenant_id: "Tenant_A".to_string(),
            user_id: user_id.to_string(),
            event_type: event_type.to_string(),
            resource_id: resource_id.map(str::to_string),
            user_type: UserType::Normal,
        }
    }

    fn engine(cost: f64, value: f64) -> (AdmissionEngine, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        let engine = AdmissionEngine::new(["Tenant_A", "Tenant_B"])
            .with_clock(clock.clone())
            .with_pricing(FlatPricing { cost, value });
        (engine, clock)
    }

    #[test]
    fn unknown_tenant_is_rejected_without_creating_user() {
        let (mut engine, _clock) = engine(0.05, 0.1);
        let mut ev = event("ghost", "LOGIN", Some("AUTH_SERVICE"));
        ev.tenant_id = "Tenant_Z".to_string();

        let err = engine.process_event(&ev).unwrap_err();
        assert_eq!(
            err,
            EngineError::UnknownTenant {
                tenant_id: "Tenant_Z".to_string()
            }
        );
        assert_eq!(engine.user_count(), 0);
        assert!(engine.resources().is_empty());
        assert_eq!(engine.stats().total_events, 0);
    }

    #[test]
    fn empty_event_type_is_rejected() {
        let (mut engine, _clock) = engine(0.05, 0.1);
        let err = engine.process_event(&event("u1", "  ", None)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidEventInput {
                field: "event_type",
                ..
            }
        ));
        assert_eq!(engine.user_count(), 0);
    }

    #[test]
    fn first_event_creates_user_with_hint_and_allows() {
        let (mut engine, _clock) = engine(0.05, 0.1);
        let mut ev = event("vip_lead_1", "VIEW_DASHBOARD", Some("API_GATEWAY"));
        ev.user_type = UserType::HighValue;

        let outcome = engine.process_event(&ev).unwrap();
        assert_eq!(outcome.decision, Decision::Allow);
        assert_eq!(outcome.reasons, vec!["Normal Behavior"]);

        let user = engine.user("vip_lead_1").unwrap();
        assert_eq!(user.user_type(), UserType::HighValue);
        assert_eq!(user.tenant_id(), "Tenant_A");
        assert!(user.session_durations().is_empty());
        assert_eq!(user.current_decision(), Decision::Allow);
    }

    #[test]
    fn user_type_hint_is_ignored_for_existing_users() {
        let (mut engine, _clock) = engine(0.05, 0.1);
        engine.process_event(&event("msg_user_1", "LOGIN", None)).unwrap();

        let mut again = event("msg_user_1", "LOGIN", None);
        again.user_type = UserType::Abusive;
        engine.process_event(&again).unwrap();

        let user = engine.user("msg_user_1").unwrap();
        assert_eq!(user.user_type(), UserType::Normal);
        assert_eq!(user.api_event_count(), 2);
    }

    #[test]
    fn burst_of_identical_calls_is_blocked() {
        let (mut engine, clock) = engine(0.3, 0.1);

        // Drive R1 past the hot-resource load from other users first.
        for i in 0..55 {
            engine
                .process_event(&event(&format!("filler_{i}"), "LOGIN", Some("R1")))
                .unwrap();
        }
        clock.advance(Duration::seconds(1));

        let mut last = None;
        for _ in 0..6 {
            last = Some(engine.process_event(&event("bad_actor_1", "API_CALL", Some("R1"))).unwrap());
        }
        let outcome = last.unwrap();

        assert!(outcome.abuse_score >= 0.7);
        assert!(outcome.abuse_score <= 1.0);
        assert_eq!(outcome.decision, Decision::Block);
        assert_eq!(outcome.reasons, vec!["Abuse Threshold Exceeded"]);
        // Hot resource doubled the cost.
        assert_eq!(outcome.cost, 0.6);

        let user = engine.user("bad_actor_1").unwrap();
        assert_eq!(user.current_decision(), Decision::Block);
        assert_eq!(user.recent_event_types().len(), 6);
    }

    #[test]
    fn five_identical_calls_only_trip_repetition() {
        let (mut engine, clock) = engine(0.3, 0.1);
        for i in 0..55 {
            engine
                .process_event(&event(&format!("filler_{i}"), "LOGIN", Some("R1")))
                .unwrap();
        }
        clock.advance(Duration::seconds(1));

        let mut last = None;
        for _ in 0..5 {
            last = Some(engine.process_event(&event("bad_actor_1", "API_CALL", Some("R1"))).unwrap());
        }
        let outcome = last.unwrap();

        // 5 events over the 0.1 minute floor is exactly 50/min, which does
        // not exceed the default limit.
        assert_eq!(outcome.abuse_score, 0.3);
        assert_eq!(outcome.decision, Decision::Allow);
        assert_eq!(outcome.reasons, vec!["Normal Behavior"]);
        assert_eq!(outcome.cost, 0.6);
    }

    #[test]
    fn event_counts_towards_its_own_hot_resource_surcharge() {
        let (mut engine, _clock) = engine(0.3, 0.1);
        for i in 0..49 {
            engine
                .process_event(&event(&format!("filler_{i}"), "LOGIN", Some("R2")))
                .unwrap();
        }

        // Load 50 after logging: not above the threshold yet.
        let at_threshold = engine
            .process_event(&event("msg_user_1", "LOGIN", Some("R2")))
            .unwrap();
        assert_eq!(at_threshold.cost, 0.3);

        // 50 prior accesses, so this event makes the load 51.
        let above = engine
            .process_event(&event("msg_user_2", "LOGIN", Some("R2")))
            .unwrap();
        assert_eq!(above.cost, 0.6);
        assert_eq!(engine.resources()[0].load, 51);
    }

    #[test]
    fn overloaded_resource_throttles_quiet_user() {
        let (mut engine, clock) = engine(0.05, 0.1);
        for i in 0..101 {
            engine
                .process_event(&event(&format!("crowd_{i}"), "VIEW_DASHBOARD", Some("DB_SHARD_1")))
                .unwrap();
        }
        clock.advance(Duration::seconds(5));

        let outcome = engine
            .process_event(&event("msg_user_2", "LOGIN", Some("DB_SHARD_1")))
            .unwrap();
        assert_eq!(outcome.decision, Decision::Throttle);
        assert_eq!(outcome.reasons, vec!["Resource DB_SHARD_1 Overloaded"]);

        clock.advance(Duration::seconds(61));
        let outcome = engine
            .process_event(&event("msg_user_2", "LOGIN", Some("DB_SHARD_1")))
            .unwrap();
        assert_eq!(outcome.decision, Decision::Allow);
    }

    #[test]
    fn valuable_user_is_flagged_for_sales_and_counted() {
        let (mut engine, clock) = engine(0.05, 4.0);
        let mut outcome = None;
        for event_type in ["CHECKOUT_ATTEMPT", "VIEW_DASHBOARD", "CHECKOUT_ATTEMPT"] {
            clock.advance(Duration::seconds(30));
            outcome = Some(
                engine
                    .process_event(&event("vip_lead_2", event_type, Some("API_GATEWAY")))
                    .unwrap(),
            );
        }
        let outcome = outcome.unwrap();
        assert_eq!(outcome.decision, Decision::FlagSales);
        assert_eq!(outcome.reasons, vec!["High ROI User"]);
        assert!((outcome.roi_score - (12.0 - 0.15)).abs() < 1e-9);

        let stats = engine.stats();
        assert_eq!(stats.total_events, 3);
        assert_eq!(stats.blocked_events, 0);
        // Only the third event crossed the ROI bar.
        assert!((stats.revenue_saved - 0.4).abs() < 1e-9);
    }

    #[test]
    fn blocked_events_accumulate_cost_saved() {
        let (mut engine, _clock) = engine(2.0, 0.0);
        for _ in 0..8 {
            engine.process_event(&event("bad_actor_2", "EXPORT_DATA", None)).unwrap();
        }
        let stats = engine.stats();
        assert_eq!(stats.total_events, 8);
        assert!(stats.blocked_events >= 1);
        assert!((stats.cost_saved - 2.0 * stats.blocked_events as f64).abs() < 1e-9);
        assert_eq!(stats.active_trials, 1);
    }

    #[test]
    fn policy_update_changes_decisions_for_following_events() {
        let (mut engine, _clock) = engine(0.05, 0.1);
        for _ in 0..5 {
            engine.process_event(&event("msg_user_3", "LOGIN", None)).unwrap();
        }
        assert_eq!(engine.user("msg_user_3").unwrap().current_decision(), Decision::Allow);

        engine
            .update_tenant_policy(
                "Tenant_A",
                &TenantPolicyUpdate {
                    abuse_threshold: Some(0.3),
                    ..Default::default()
                },
            )
            .unwrap();
        let outcome = engine.process_event(&event("msg_user_3", "LOGIN", None)).unwrap();
        assert_eq!(outcome.decision, Decision::Block);
    }

    #[test]
    fn invalid_policy_update_changes_nothing() {
        let (mut engine, _clock) = engine(0.05, 0.1);
        let before = engine.tenant("Tenant_B").unwrap().clone();

        let err = engine
            .update_tenant_policy(
                "Tenant_B",
                &TenantPolicyUpdate {
                    max_api_rate_per_minute: Some(120.0),
                    weight_abuse: Some(0.4),
                    abuse_threshold: Some(1.5),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.field(), Some("abuse_threshold"));
        assert_eq!(engine.tenant("Tenant_B").unwrap(), &before);

        let err = engine
            .update_tenant_policy("Nope", &TenantPolicyUpdate::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownTenant { .. }));
    }

    #[test]
    fn users_are_listed_most_recent_first() {
        let (mut engine, clock) = engine(0.05, 0.1);
        engine.process_event(&event("first", "LOGIN", None)).unwrap();
        clock.advance(Duration::seconds(10));
        engine.process_event(&event("second", "LOGIN", None)).unwrap();

        let ids: Vec<&str> = engine.users().iter().map(|u| u.user_id()).collect();
        assert_eq!(ids, vec!["second", "first"]);
        assert_eq!(engine.tenants().len(), 2);
        assert!(matches!(
            engine.user("missing"),
            Err(EngineError::UnknownUser { .. })
        ));
    }
}
