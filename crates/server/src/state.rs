use std::sync::Arc;

use referboard_core::{Config, SanitizedConfig, TicketEngine};

/// Shared application state
pub struct AppState {
    config: Config,
    engine: Arc<TicketEngine>,
}

impl AppState {
    pub fn new(config: Config, engine: Arc<TicketEngine>) -> Self {
        Self { config, engine }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn engine(&self) -> &TicketEngine {
        self.engine.as_ref()
    }
}
