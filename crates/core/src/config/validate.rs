use super::{types::Config, AuthMethod, ConfigError};

/// Validate configuration.
///
/// Serde already guarantees the `[auth]` section exists; everything here is
/// about values that parse fine but cannot work at runtime.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::ApiKey
        && config.auth.api_key.as_deref().unwrap_or("").is_empty()
    {
        return Err(ConfigError::ValidationError(
            "auth.api_key must be set when auth.method = \"api_key\"".to_string(),
        ));
    }

    if config.upstream.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "upstream.base_url cannot be empty".to_string(),
        ));
    }

    let hydration = &config.hydration;
    if !hydration.backoff_multiplier.is_finite() || hydration.backoff_multiplier < 1.0 {
        return Err(ConfigError::ValidationError(
            "hydration.backoff_multiplier must be a finite number >= 1.0".to_string(),
        ));
    }
    if hydration.default_page_size == 0 {
        return Err(ConfigError::ValidationError(
            "hydration.default_page_size must be > 0".to_string(),
        ));
    }
    if hydration.max_page_size < hydration.default_page_size {
        return Err(ConfigError::ValidationError(format!(
            "hydration.max_page_size ({}) is smaller than default_page_size ({})",
            hydration.max_page_size, hydration.default_page_size
        )));
    }
    if hydration.max_parallel_fetches == 0 {
        return Err(ConfigError::ValidationError(
            "hydration.max_parallel_fetches must be > 0".to_string(),
        ));
    }

    if config.search.max_results == 0 {
        return Err(ConfigError::ValidationError(
            "search.max_results must be > 0".to_string(),
        ));
    }

    if config.rate_limit.enabled && config.rate_limit.requests_per_minute == 0 {
        return Err(ConfigError::ValidationError(
            "rate_limit.requests_per_minute must be > 0 when rate limiting is enabled"
                .to_string(),
        ));
    }

    Ok(())
}
