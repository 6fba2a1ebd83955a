pub mod auth;
pub mod catalog;
pub mod config;
pub mod metrics;
pub mod testing;

pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, AuthRequest, Authenticator, Identity,
    NoneAuthenticator,
};
pub use catalog::{
    CatalogClient, CatalogError, CatalogService, CatalogStatus, DetailRecord, IndexEntry, Page,
    PageResult, PokeApiClient, SearchPreview, SortKey,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, Config, ConfigError,
    SanitizedConfig,
};
