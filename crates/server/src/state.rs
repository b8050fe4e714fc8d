use std::sync::Arc;

use mediadex_core::{Config, FederatedSearch, GroupStore, SanitizedConfig, WriteRouter};
use prometheus::Registry;

/// Shared application state
pub struct AppState {
    config: Config,
    router: WriteRouter,
    search: FederatedSearch,
    groups: Arc<dyn GroupStore>,
    metrics_registry: Registry,
}

impl AppState {
    pub fn new(
        config: Config,
        router: WriteRouter,
        search: FederatedSearch,
        groups: Arc<dyn GroupStore>,
        metrics_registry: Registry,
    ) -> Self {
        Self {
            config,
            router,
            search,
            groups,
            metrics_registry,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn router(&self) -> &WriteRouter {
        &self.router
    }

    pub fn search(&self) -> &FederatedSearch {
        &self.search
    }

    pub fn groups(&self) -> &dyn GroupStore {
        self.groups.as_ref()
    }

    pub fn metrics_registry(&self) -> &Registry {
        &self.metrics_registry
    }
}
