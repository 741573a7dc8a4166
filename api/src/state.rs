use std::sync::Arc;

use tokio::sync::RwLock;
use trialguard_core::engine::AdmissionEngine;

/// Shared handler state. Event ingestion and policy updates take the write
/// lock for the whole call, so events are admitted one at a time; reads
/// share the read lock.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RwLock<AdmissionEngine>>,
}

impl AppState {
    pub fn new(engine: AdmissionEngine) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
        }
    }
}
