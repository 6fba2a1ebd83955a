use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub hydration: HydrationConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Required when `method = "api_key"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    ApiKey,
}

/// Upstream catalog (PokeAPI) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Base URL of the REST API, without trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Page size used for the one-shot index load. Must cover the whole catalog.
    #[serde(default = "default_index_limit")]
    pub index_limit: u32,
    /// Where search previews point their sprite URLs.
    #[serde(default = "default_sprite_base_url")]
    pub sprite_base_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            index_limit: default_index_limit(),
            sprite_base_url: default_sprite_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "https://pokeapi.co/api/v2".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_index_limit() -> u32 {
    10_000
}

fn default_sprite_base_url() -> String {
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon".to_string()
}

/// Detail hydration configuration (retry policy and page sizing)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HydrationConfig {
    /// Additional attempts after the first one, for transient upstream errors only.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
    /// Exponential backoff multiplier.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Upper bound on concurrent detail fetches within one page.
    #[serde(default = "default_max_parallel_fetches")]
    pub max_parallel_fetches: usize,
    /// Page size when the client does not ask for one.
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    /// Largest page size a client may request.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

impl Default for HydrationConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            backoff_multiplier: default_backoff_multiplier(),
            max_parallel_fetches: default_max_parallel_fetches(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_max_retries() -> u32 {
    2
}

fn default_initial_backoff() -> u64 {
    500
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_parallel_fetches() -> usize {
    100
}

fn default_page_size() -> usize {
    20
}

fn default_max_page_size() -> usize {
    100
}

/// Name search configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
        }
    }
}

fn default_max_results() -> usize {
    10
}

/// Per-client request admission
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_limit_enabled")]
    pub enabled: bool,
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_rate_limit_enabled(),
            requests_per_minute: default_requests_per_minute(),
        }
    }
}

fn default_rate_limit_enabled() -> bool {
    true
}

fn default_requests_per_minute() -> u32 {
    100
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub hydration: HydrationConfig,
    pub search: SearchConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub api_key_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::ApiKey => "api_key".to_string(),
                },
                api_key_configured: config
                    .auth
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
            },
            server: config.server.clone(),
            upstream: config.upstream.clone(),
            hydration: config.hydration.clone(),
            search: config.search.clone(),
            rate_limit: config.rate_limit.clone(),
        }
    }
}
