use std::collections::BTreeMap;

use clap::Args;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::json;
use trialguard_core::events::{EventOutcome, UsageEvent};
use trialguard_core::profile::UserType;

use crate::util::{EXIT_OK, exit_code_for_status, exit_error, raw_api_request};

const EVENT_TYPES: [&str; 5] = [
    "LOGIN",
    "VIEW_DASHBOARD",
    "API_CALL",
    "EXPORT_DATA",
    "CHECKOUT_ATTEMPT",
];
const RESOURCES: [&str; 4] = ["DB_SHARD_1", "API_GATEWAY", "EXPORT_WORKER", "AUTH_SERVICE"];
const HIGH_VALUE_EVENT_TYPES: [&str; 2] = ["CHECKOUT_ATTEMPT", "VIEW_DASHBOARD"];
/// Users per class; a small pool so repeated runs aggregate on the same ids.
const USERS_PER_CLASS: u32 = 5;
const MIN_EVENTS: usize = 5;
const MAX_EVENTS: usize = 20;

#[derive(Args)]
pub struct SimulateArgs {
    /// Number of events to send (default: random between 5 and 20)
    #[arg(long)]
    pub events: Option<usize>,
    /// Seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Draw one synthetic event. Classes are mixed 70/20/10 across
/// NORMAL, ABUSIVE and HIGH_VALUE users.
pub fn plan_event<R: Rng>(rng: &mut R, tenants: &[String]) -> Option<UsageEvent> {
    let tenant_id = tenants.choose(rng)?.clone();

    let roll: f64 = rng.r#gen();
    let (user_type, user_base) = if roll < 0.7 {
        (UserType::Normal, "msg_user")
    } else if roll < 0.9 {
        (UserType::Abusive, "bad_actor")
    } else {
        (UserType::HighValue, "vip_lead")
    };
    let suffix = rng.gen_range(1..=USERS_PER_CLASS);

    let (event_type, resource_id) = match user_type {
        UserType::Abusive => ("API_CALL", "EXPORT_WORKER"),
        UserType::HighValue => (*HIGH_VALUE_EVENT_TYPES.choose(rng)?, "API_GATEWAY"),
        UserType::Normal => (*EVENT_TYPES.choose(rng)?, *RESOURCES.choose(rng)?),
    };

    Some(UsageEvent {
        tenant_id,
        user_id: format!("{user_base}_{suffix}"),
        event_type: event_type.to_string(),
        resource_id: Some(resource_id.to_string()),
        user_type,
    })
}

pub fn event_count<R: Rng>(rng: &mut R, requested: Option<usize>) -> usize {
    requested.unwrap_or_else(|| rng.gen_range(MIN_EVENTS..=MAX_EVENTS))
}

fn log_line(event: &UsageEvent, outcome: &EventOutcome) -> String {
    format!(
        "[{}] User {} ({}) -> {} on {} : {}",
        event.tenant_id,
        event.user_id,
        event.user_type.as_str(),
        event.event_type,
        event.resource_id.as_deref().unwrap_or("-"),
        outcome.decision,
    )
}

fn tenant_names(body: &serde_json::Value) -> Vec<String> {
    body["tenants"]
        .as_array()
        .map(|tenants| {
            tenants
                .iter()
                .filter_map(|t| t["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub async fn run(api_url: &str, args: SimulateArgs) -> i32 {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let tenants = match raw_api_request(api_url, reqwest::Method::GET, "/v1/tenants", None).await {
        Ok((200, body)) => tenant_names(&body),
        Ok((status, body)) => {
            eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
            return exit_code_for_status(status);
        }
        Err(failure) => return failure.report(),
    };
    if tenants.is_empty() {
        exit_error(
            "The API reports no tenants to simulate against",
            Some("Configure tenants with TRIALGUARD_TENANTS on the API server."),
        );
    }

    let count = event_count(&mut rng, args.events);
    tracing::debug!(count, tenants = ?tenants, seed = ?args.seed, "starting simulation");

    let mut decisions: BTreeMap<String, usize> = BTreeMap::new();
    for _ in 0..count {
        let Some(event) = plan_event(&mut rng, &tenants) else {
            break;
        };
        let body = match serde_json::to_value(&event) {
            Ok(v) => v,
            Err(e) => exit_error(&format!("Failed to encode event: {e}"), None),
        };

        let (status, resp) =
            match raw_api_request(api_url, reqwest::Method::POST, "/v1/events", Some(&body)).await {
                Ok(r) => r,
                Err(failure) => return failure.report(),
            };
        if exit_code_for_status(status) != EXIT_OK {
            eprintln!("{}", serde_json::to_string_pretty(&resp).unwrap_or_default());
            return exit_code_for_status(status);
        }

        let outcome: EventOutcome = match serde_json::from_value(resp) {
            Ok(o) => o,
            Err(e) => exit_error(&format!("Unexpected event response: {e}"), None),
        };
        println!("{}", log_line(&event, &outcome));
        *decisions.entry(outcome.decision.to_string()).or_default() += 1;
    }

    let summary = json!({
        "events_sent": count,
        "decisions": decisions,
    });
    println!("{}", serde_json::to_string_pretty(&summary).unwrap_or_default());
    EXIT_OK
}
