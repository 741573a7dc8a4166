use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::resources::HIGH_LOAD;

pub const API_CALL_EVENT: &str = "API_CALL";
pub const CHECKOUT_EVENT: &str = "CHECKOUT_ATTEMPT";

const FLAT_EVENT_COST: f64 = 0.05;
const FLAT_EVENT_VALUE: f64 = 0.1;
const HOT_RESOURCE_COST_MULTIPLIER: f64 = 2.0;

/// Cost incurred and value delivered by one event, in monetary units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventPrice {
    pub cost: f64,
    pub value: f64,
}

/// Prices usage events. `resource_load` is the load of the touched resource
/// after this event was counted, or `None` when no resource was touched.
pub trait PricingModel: Send + Sync {
    fn price(&mut self, event_type: &str, resource_load: Option<usize>) -> EventPrice;
}

/// Stand-in pricing: API calls cost 0.1..0.5, checkout attempts are worth
/// 0.5..2.0, everything else is flat. Touching a hot resource doubles cost.
#[derive(Debug)]
pub struct SyntheticPricing {
    rng: StdRng,
}

impl SyntheticPricing {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SyntheticPricing {
    fn default() -> Self {
        Self::new()
    }
}

impl PricingModel for SyntheticPricing {
    fn price(&mut self, event_type: &str, resource_load: Option<usize>) -> EventPrice {
        let mut cost = if event_type == API_CALL_EVENT {
            self.rng.gen_range(0.1..0.5)
        } else {
            FLAT_EVENT_COST
        };
        let value = if event_type == CHECKOUT_EVENT {
            self.rng.gen_range(0.5..2.0)
        } else {
            FLAT_EVENT_VALUE
        };

        if resource_load.is_some_and(|load| load > HIGH_LOAD) {
            cost *= HOT_RESOURCE_COST_MULTIPLIER;
        }

        EventPrice { cost, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_calls_cost_within_range() {
        let mut pricing = SyntheticPricing::with_seed(7);
        for _ in 0..100 {
            let price = pricing.price(API_CALL_EVENT, None);
            assert!((0.1..0.5).contains(&price.cost));
            assert_eq!(price.value, FLAT_EVENT_VALUE);
        }
    }

    #[test]
    fn checkout_value_within_range() {
        let mut pricing = SyntheticPricing::with_seed(7);
        for _ in 0..100 {
            let price = pricing.price(CHECKOUT_EVENT, Some(3));
            assert_eq!(price.cost, FLAT_EVENT_COST);
            assert!((0.5..2.0).contains(&price.value));
        }
    }

    #[test]
    fn hot_resource_doubles_cost() {
        let mut pricing = SyntheticPricing::with_seed(1);
        assert_eq!(pricing.price("LOGIN", Some(50)).cost, FLAT_EVENT_COST);
        assert_eq!(pricing.price("LOGIN", Some(51)).cost, FLAT_EVENT_COST * 2.0);
    }

    #[test]
    fn seeded_pricing_is_reproducible() {
        let mut a = SyntheticPricing::with_seed(42);
        let mut b = SyntheticPricing::with_seed(42);
        for _ in 0..10 {
            assert_eq!(a.price(API_CALL_EVENT, None), b.price(API_CALL_EVENT, None));
        }
    }
}
