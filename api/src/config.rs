const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TENANTS: &str = "Tenant_A,Tenant_B";

/// Process configuration, read once at startup from the environment
/// (after `.env` has been loaded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Tenants registered with default policies at startup
    pub tenants: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var("PORT").ok().as_deref(),
            std::env::var("TRIALGUARD_TENANTS").ok().as_deref(),
        )
    }

    fn from_values(port: Option<&str>, tenants: Option<&str>) -> Self {
        let port = port
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let mut tenants = parse_list(tenants.unwrap_or(DEFAULT_TENANTS));
        if tenants.is_empty() {
            tenants = parse_list(DEFAULT_TENANTS);
        }

        Self { port, tenants }
    }
}

/// Split a comma-separated list, trimming entries and dropping empty or
/// repeated ones while keeping first-seen order.
pub fn parse_list(raw: &str) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for entry in raw.split(',') {
        let trimmed = entry.trim();
        if trimmed.is_empty() || values.iter().any(|existing| existing == trimmed) {
            continue;
        }
        values.push(trimmed.to_string());
    }
    values
}
