use clap::Subcommand;

use crate::util::api_request;

#[derive(Subcommand)]
pub enum UserCommands {
    /// List tracked trial users, most recently active first
    List,
    /// Show one user's fingerprint, scores and decision
    Show {
        /// Trial user id
        user_id: String,
    },
}

pub async fn run(api_url: &str, raw: bool, command: UserCommands) -> i32 {
    match command {
        UserCommands::List => {
            api_request(api_url, reqwest::Method::GET, "/v1/users", None, raw).await
        }
        UserCommands::Show { user_id } => {
            api_request(
                api_url,
                reqwest::Method::GET,
                &format!("/v1/users/{user_id}"),
                None,
                raw,
            )
            .await
        }
    }
}
