use std::sync::Arc;

use pokedex_core::{Authenticator, CatalogService, Config, SanitizedConfig};

use crate::api::RateLimiter;

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    catalog: Arc<CatalogService>,
    rate_limiter: Option<RateLimiter>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        catalog: Arc<CatalogService>,
    ) -> Self {
        let rate_limiter = config
            .rate_limit
            .enabled
            .then(|| RateLimiter::new(config.rate_limit.requests_per_minute));

        Self {
            config,
            authenticator,
            catalog,
            rate_limiter,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    /// `None` when rate limiting is disabled.
    pub fn rate_limiter(&self) -> Option<&RateLimiter> {
        self.rate_limiter.as_ref()
    }
}
