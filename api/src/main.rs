use std::net::SocketAddr;

use axum::Router;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trialguard_core::engine::AdmissionEngine;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod extract;
mod middleware;
mod routes;
mod state;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "TrialGuard API",
        version = "0.1.0",
        description = "Admission control for free-trial traffic: scores every usage event for abuse and ROI and decides whether to allow, throttle, block or flag it for sales."
    ),
    paths(
        routes::health::health_check,
        routes::events::process_event,
        routes::events::process_events_batch,
        routes::users::list_users,
        routes::users::get_user,
        routes::tenants::list_tenants,
        routes::tenants::get_tenant,
        routes::tenants::update_tenant,
        routes::resources::list_resources,
        routes::stats::get_stats,
    ),
    components(schemas(
        HealthResponse,
        trialguard_core::error::ApiError,
        trialguard_core::events::UsageEvent,
        trialguard_core::events::EventOutcome,
        trialguard_core::events::BatchUsageEvents,
        trialguard_core::events::BatchOutcome,
        trialguard_core::decision::Decision,
        trialguard_core::profile::UserType,
        trialguard_core::profile::UserProfile,
        trialguard_core::profile::RecordedEvent,
        trialguard_core::policy::TenantPolicy,
        trialguard_core::policy::TenantPolicyUpdate,
        trialguard_core::resources::ResourceLoad,
        trialguard_core::resources::LoadBand,
        trialguard_core::stats::StatsSnapshot,
        routes::users::UserListResponse,
        routes::tenants::TenantListResponse,
        routes::resources::ResourceListResponse,
    ))
)]
struct ApiDoc;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Number of configured tenants
    pub tenants: usize,
    /// Number of trial users seen so far
    pub tracked_users: usize,
}

/// Dashboard read endpoints. They share one rate limit bucket per client.
fn read_routes() -> Router<state::AppState> {
    Router::new()
        .merge(routes::users::router())
        .merge(routes::tenants::read_router())
        .merge(routes::resources::router())
        .merge(routes::stats::router())
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "trialguard_api=debug,trialguard_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = config::ServerConfig::from_env();
    tracing::info!(tenants = ?config.tenants, "registering tenants with default policies");

    let app_state = state::AppState::new(AdmissionEngine::new(config.tenants.iter()));

    let cors_layer = middleware::cors::build_cors_layer();

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(routes::events::router().layer(middleware::rate_limit::events_write_layer()))
        .merge(read_routes().layer(middleware::rate_limit::reads_layer()))
        .merge(
            routes::tenants::write_router().layer(middleware::rate_limit::policy_write_layer()),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("TrialGuard API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{send, state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    const DASHBOARD_URIS: [&str; 5] = [
        "/v1/users",
        "/v1/tenants",
        "/v1/tenants/Tenant_A",
        "/v1/resources",
        "/v1/stats",
    ];

    #[tokio::test]
    async fn read_routes_serve_every_dashboard_endpoint() {
        let (state, _clock) = state();
        for uri in DASHBOARD_URIS {
            let app = read_routes().with_state(state.clone());
            let (status, _body) = send(app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
        }
    }

    #[tokio::test]
    async fn dashboard_reads_share_one_rate_limit_bucket() {
        let (state, _clock) = state();
        let app = read_routes()
            .layer(middleware::rate_limit::reads_layer())
            .with_state(state);

        // Burst is 30 per client. Spread over five endpoints, separate
        // buckets would admit all 40 requests.
        let mut limited = 0;
        for i in 0..40 {
            let request = Request::builder()
                .uri(DASHBOARD_URIS[i % DASHBOARD_URIS.len()])
                .header("x-forwarded-for", "203.0.113.7")
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                limited += 1;
            }
        }
        assert!(limited >= 1, "expected the shared read limit to trip");
    }
}
