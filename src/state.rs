use std::sync::Arc;
use std::time::Instant;

use crate::observability::metrics::Metrics;
use crate::store::DocumentStore;

pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub metrics: Metrics,
    pub environment: String,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, environment: impl Into<String>) -> Self {
        Self {
            store,
            metrics: Metrics::new(),
            environment: environment.into(),
            started_at: Instant::now(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
