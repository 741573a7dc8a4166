use clap::Subcommand;
use trialguard_core::events::UsageEvent;
use trialguard_core::profile::UserType;

use crate::util::{api_request, exit_error, read_json_from_file};

#[derive(Subcommand)]
pub enum EventCommands {
    /// Submit one usage event and print the admission decision
    Send {
        /// Tenant the user belongs to (e.g. "Tenant_A")
        #[arg(long)]
        tenant: String,
        /// Trial user id
        #[arg(long)]
        user: String,
        /// Event type (e.g. "LOGIN", "API_CALL", "CHECKOUT_ATTEMPT")
        #[arg(long)]
        event_type: String,
        /// Shared resource the event touches (e.g. "DB_SHARD_1")
        #[arg(long)]
        resource: Option<String>,
        /// User classification hint, applied only when the user is first seen
        #[arg(long, value_parser = parse_user_type, default_value = "NORMAL")]
        user_type: UserType,
    },
    /// Submit several events in order
    Batch {
        /// JSON file with {"events": [...]} (use '-' for stdin)
        #[arg(long)]
        file: String,
    },
}

pub fn parse_user_type(raw: &str) -> Result<UserType, String> {
    match raw.trim().to_ascii_uppercase().replace('-', "_").as_str() {
        "NORMAL" => Ok(UserType::Normal),
        "ABUSIVE" => Ok(UserType::Abusive),
        "HIGH_VALUE" => Ok(UserType::HighValue),
        other => Err(format!(
            "unknown user type '{other}' (expected NORMAL, ABUSIVE or HIGH_VALUE)"
        )),
    }
}

pub async fn run(api_url: &str, raw: bool, command: EventCommands) -> i32 {
    match command {
        EventCommands::Send {
            tenant,
            user,
            event_type,
            resource,
            user_type,
        } => {
            let event = UsageEvent {
                tenant_id: tenant,
                user_id: user,
                event_type,
                resource_id: resource,
                user_type,
            };
            send(api_url, raw, &event).await
        }
        EventCommands::Batch { file } => batch(api_url, raw, &file).await,
    }
}

async fn send(api_url: &str, raw: bool, event: &UsageEvent) -> i32 {
    let body = match serde_json::to_value(event) {
        Ok(v) => v,
        Err(e) => exit_error(&format!("Failed to encode event: {e}"), None),
    };
    api_request(api_url, reqwest::Method::POST, "/v1/events", Some(body), raw).await
}

async fn batch(api_url: &str, raw: bool, file: &str) -> i32 {
    let body = match read_json_from_file(file) {
        Ok(v) => v,
        Err(e) => exit_error(&e, Some("Provide a JSON file with {\"events\": [...]}")),
    };

    api_request(api_url, reqwest::Method::POST, "/v1/events/batch", Some(body), raw).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_type_parsing_accepts_loose_spelling() {
        assert_eq!(parse_user_type("normal"), Ok(UserType::Normal));
        assert_eq!(parse_user_type("high-value"), Ok(UserType::HighValue));
        assert_eq!(parse_user_type(" ABUSIVE "), Ok(UserType::Abusive));
        assert!(parse_user_type("vip").is_err());
    }
}
