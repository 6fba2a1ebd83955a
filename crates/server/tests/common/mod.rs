//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock upstream catalog injected, enabling E2E testing without
//! network access.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use pokedex_core::{
    config::{AuthConfig, RateLimitConfig},
    create_authenticator, AuthMethod, Authenticator, CatalogClient, CatalogService,
    testing::MockCatalogClient,
};
use pokedex_server::{create_router, AppState};

/// Re-export fixtures for test convenience
pub use pokedex_core::testing::fixtures;

/// Test fixture for E2E testing with a mock upstream.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_list() {
///     let fixture = TestFixture::new().await;
///     fixture.add_pokemon(&[(1, "bulbasaur")]).await;
///     fixture.load_index().await;
///
///     let response = fixture.get("/api/v1/pokemon").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock upstream - configure records and failures
    pub client: Arc<MockCatalogClient>,
    /// The catalog behind the router
    pub catalog: Arc<CatalogService>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with no auth and no rate limiting.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let client = Arc::new(MockCatalogClient::new());

        let mut config = fixtures::test_config();
        config.auth = match test_config.api_key {
            Some(key) => AuthConfig {
                method: AuthMethod::ApiKey,
                api_key: Some(key),
            },
            None => AuthConfig {
                method: AuthMethod::None,
                api_key: None,
            },
        };
        config.rate_limit = match test_config.requests_per_minute {
            Some(rpm) => RateLimitConfig {
                enabled: true,
                requests_per_minute: rpm,
            },
            None => RateLimitConfig {
                enabled: false,
                ..Default::default()
            },
        };

        let authenticator: Arc<dyn Authenticator> = Arc::from(
            create_authenticator(&config.auth).expect("Failed to create authenticator"),
        );
        let catalog = Arc::new(CatalogService::new(
            Arc::clone(&client) as Arc<dyn CatalogClient>,
            &config,
        ));

        let state = Arc::new(AppState::new(config, authenticator, Arc::clone(&catalog)));
        let router = create_router(state);

        Self {
            router,
            client,
            catalog,
        }
    }

    /// Add records to the mock upstream.
    pub async fn add_pokemon(&self, pokemon: &[(u32, &str)]) {
        for (id, name) in pokemon {
            self.client.add_pokemon(fixtures::pokemon(*id, name)).await;
        }
    }

    /// Run the index load and wait for it.
    pub async fn load_index(&self) {
        self.catalog
            .load_index()
            .await
            .expect("Failed to load index");
        self.client.clear_recorded().await;
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.get_with_headers(path, &[]).await
    }

    /// Send a GET request with extra headers.
    pub async fn get_with_headers(&self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        let mut request_builder = Request::builder().method("GET").uri(path);
        for (name, value) in headers {
            request_builder = request_builder.header(*name, *value);
        }
        let request = request_builder.body(Body::empty()).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Require this API key
    pub api_key: Option<String>,
    /// Enable rate limiting at this rate
    pub requests_per_minute: Option<u32>,
}

impl TestConfig {
    pub fn with_api_key(key: &str) -> Self {
        Self {
            api_key: Some(key.to_string()),
            ..Default::default()
        }
    }

    pub fn with_rate_limit(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute: Some(requests_per_minute),
            ..Default::default()
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
