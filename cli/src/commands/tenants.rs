use clap::{Args, Subcommand};
use trialguard_core::policy::TenantPolicyUpdate;

use crate::util::{api_request, exit_error};

#[derive(Subcommand)]
pub enum TenantCommands {
    /// List tenant policies
    List,
    /// Show one tenant policy
    Show {
        /// Tenant name
        tenant_id: String,
    },
    /// Change one or more policy fields
    Update {
        /// Tenant name
        tenant_id: String,
        #[command(flatten)]
        fields: PolicyFields,
    },
}

#[derive(Args, Debug, Default)]
pub struct PolicyFields {
    /// Events per minute above which the rate signal fires
    #[arg(long)]
    pub max_api_rate_per_minute: Option<f64>,
    /// Accumulated cost above which the cost signal fires
    #[arg(long)]
    pub max_cost_per_session: Option<f64>,
    /// Abuse score at which the abuse gate opens, within (0, 1]
    #[arg(long)]
    pub abuse_threshold: Option<f64>,
    #[arg(long)]
    pub roi_min_threshold: Option<f64>,
    #[arg(long)]
    pub weight_abuse: Option<f64>,
    #[arg(long)]
    pub weight_cost: Option<f64>,
    #[arg(long)]
    pub weight_value: Option<f64>,
}

impl From<PolicyFields> for TenantPolicyUpdate {
    fn from(fields: PolicyFields) -> Self {
        TenantPolicyUpdate {
            max_api_rate_per_minute: fields.max_api_rate_per_minute,
            max_cost_per_session: fields.max_cost_per_session,
            abuse_threshold: fields.abuse_threshold,
            roi_min_threshold: fields.roi_min_threshold,
            weight_abuse: fields.weight_abuse,
            weight_cost: fields.weight_cost,
            weight_value: fields.weight_value,
        }
    }
}

pub async fn run(api_url: &str, raw: bool, command: TenantCommands) -> i32 {
    match command {
        TenantCommands::List => {
            api_request(api_url, reqwest::Method::GET, "/v1/tenants", None, raw).await
        }
        TenantCommands::Show { tenant_id } => {
            api_request(
                api_url,
                reqwest::Method::GET,
                &format!("/v1/tenants/{tenant_id}"),
                None,
                raw,
            )
            .await
        }
        TenantCommands::Update { tenant_id, fields } => {
            update(api_url, raw, &tenant_id, fields.into()).await
        }
    }
}

async fn update(api_url: &str, raw: bool, tenant_id: &str, update: TenantPolicyUpdate) -> i32 {
    if update.is_empty() {
        exit_error(
            "No policy fields given",
            Some("Pass at least one flag, e.g. --abuse-threshold 0.6"),
        );
    }
    let body = match serde_json::to_value(&update) {
        Ok(v) => v,
        Err(e) => exit_error(&format!("Failed to encode policy update: {e}"), None),
    };

    api_request(
        api_url,
        reqwest::Method::PATCH,
        &format!("/v1/tenants/{tenant_id}"),
        Some(body),
        raw,
    )
    .await
}
