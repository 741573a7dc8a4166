pub mod events;
pub mod health;
pub mod resources;
pub mod stats;
pub mod tenants;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use tower::ServiceExt;
    use trialguard_core::clock::ManualClock;
    use trialguard_core::engine::AdmissionEngine;
    use trialguard_core::pricing::SyntheticPricing;

    use crate::state::AppState;

    /// State with the default tenants, a frozen clock and seeded pricing.
    pub fn state() -> (AppState, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        let engine = AdmissionEngine::new(["Tenant_A", "Tenant_B"])
            .with_clock(clock.clone())
            .with_pricing(SyntheticPricing::with_seed(11));
        (AppState::new(engine), clock)
    }

    pub async fn send(
        router: Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}
