//! Testing utilities and mock implementations for E2E tests.
//!
//! This module provides a mock of the upstream catalog, allowing the index,
//! cache and hydration pipeline to be exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use pokedex_core::testing::{MockCatalogClient, fixtures};
//!
//! let client = MockCatalogClient::new();
//! client.add_pokemon(fixtures::pokemon(1, "bulbasaur")).await;
//! client.fail_everywhere(1).await;
//!
//! // Use in CatalogService::new(...)
//! ```

mod mock_catalog_client;

pub use mock_catalog_client::{MockCatalogClient, RecordedCatalogCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::time::Duration;

    use crate::catalog::{Ability, CatalogError, DetailRecord, Form, Move, RetryPolicy};
    use crate::config::{AuthConfig, AuthMethod, Config, HydrationConfig};

    /// Listing URL for an id, in the upstream's shape.
    pub fn pokemon_url(id: u32) -> String {
        format!("https://pokeapi.co/api/v2/pokemon/{}/", id)
    }

    /// Create a test detail record with reasonable defaults.
    pub fn pokemon(id: u32, name: &str) -> DetailRecord {
        DetailRecord {
            id,
            name: name.to_string(),
            number: id,
            image_url: format!(
                "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/{}.png",
                id
            ),
            abilities: vec![Ability {
                name: "overgrow".to_string(),
                is_hidden: false,
            }],
            moves: vec![Move {
                name: "tackle".to_string(),
                level_learned_at: Some(1),
            }],
            forms: vec![Form {
                name: name.to_string(),
                url: format!("https://pokeapi.co/api/v2/pokemon-form/{}/", id),
            }],
        }
    }

    /// Upstream 503.
    pub fn server_error() -> CatalogError {
        CatalogError::ApiError {
            status: 503,
            message: "Service Unavailable".to_string(),
        }
    }

    /// Two retries with a 1ms initial backoff.
    pub fn fast_retry_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            initial_backoff: Duration::from_millis(1),
            multiplier: 2.0,
        }
    }

    /// Default config with millisecond-scale backoff.
    pub fn test_config() -> Config {
        Config {
            auth: AuthConfig {
                method: AuthMethod::None,
                api_key: None,
            },
            server: Default::default(),
            upstream: Default::default(),
            hydration: HydrationConfig {
                initial_backoff_ms: 1,
                ..Default::default()
            },
            search: Default::default(),
            rate_limit: Default::default(),
        }
    }
}
