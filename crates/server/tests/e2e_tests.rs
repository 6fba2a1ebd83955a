//! End-to-end tests with a mocked upstream catalog.
//!
//! These tests run the full server stack in-process with a mock
//! implementation of the PokeAPI client.

mod common;

use axum::http::StatusCode;
use pokedex_core::catalog::encode_cursor;

use common::{fixtures, TestConfig, TestFixture};

// =============================================================================
// Basic API Tests
// =============================================================================

#[tokio::test]
async fn test_health_before_index_load() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/health").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["index_loaded"], false);
    assert_eq!(response.body["index_size"], 0);
}

#[tokio::test]
async fn test_health_after_index_load() {
    let fixture = TestFixture::new().await;
    fixture.add_pokemon(&[(1, "bulbasaur"), (2, "ivysaur")]).await;
    fixture.load_index().await;

    let response = fixture.get("/api/v1/health").await;

    assert_eq!(response.body["index_loaded"], true);
    assert_eq!(response.body["index_size"], 2);
    assert_eq!(response.body["cached_details"], 0);
}

#[tokio::test]
async fn test_config_is_sanitized() {
    let fixture = TestFixture::with_config(TestConfig::with_api_key("super-secret")).await;

    let response = fixture
        .get_with_headers("/api/v1/config", &[("X-API-Key", "super-secret")])
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["auth"]["method"], "api_key");
    assert_eq!(response.body["auth"]["api_key_configured"], true);
    assert!(!response.body.to_string().contains("super-secret"));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/metrics").await;

    assert_status!(response, StatusCode::OK);
    let text = response.body.as_str().unwrap_or_default();
    assert!(text.contains("pokedex_http_requests_total"));
    assert!(text.contains("pokedex_catalog_index_loaded"));
}

// =============================================================================
// Pagination
// =============================================================================

#[tokio::test]
async fn test_list_by_number() {
    let fixture = TestFixture::new().await;
    fixture.add_pokemon(&[(1, "pikachu"), (2, "charizard")]).await;
    fixture.load_index().await;

    let response = fixture.get("/api/v1/pokemon").await;

    assert_status!(response, StatusCode::OK);
    let edges = response.body["edges"].as_array().unwrap();
    assert_eq!(edges.len(), 2);
    assert_eq!(edges[0]["node"]["id"], 1);
    assert_eq!(edges[0]["cursor"], "MA==");
    assert_eq!(edges[1]["cursor"], encode_cursor(1));
    assert_eq!(response.body["totalCount"], 2);
    assert_eq!(response.body["pageInfo"]["hasNextPage"], false);
    assert_eq!(response.body["pageInfo"]["hasPreviousPage"], false);
    assert_eq!(response.body["pageInfo"]["startCursor"], "MA==");
}

#[tokio::test]
async fn test_list_by_name() {
    let fixture = TestFixture::new().await;
    fixture.add_pokemon(&[(1, "pikachu"), (2, "charizard")]).await;
    fixture.load_index().await;

    let response = fixture.get("/api/v1/pokemon?sort_by=name").await;

    let edges = response.body["edges"].as_array().unwrap();
    assert_eq!(edges[0]["node"]["name"], "charizard");
    assert_eq!(edges[1]["node"]["name"], "pikachu");
}

#[tokio::test]
async fn test_list_follows_after_cursor() {
    let fixture = TestFixture::new().await;
    fixture
        .add_pokemon(&[(1, "bulbasaur"), (2, "ivysaur"), (3, "venusaur")])
        .await;
    fixture.load_index().await;

    let first = fixture.get("/api/v1/pokemon?first=2").await;
    assert_eq!(first.body["pageInfo"]["hasNextPage"], true);
    let end_cursor = first.body["pageInfo"]["endCursor"].as_str().unwrap().to_string();

    let second = fixture
        .get(&format!("/api/v1/pokemon?first=2&after={}", end_cursor))
        .await;

    let edges = second.body["edges"].as_array().unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0]["node"]["id"], 3);
    assert_eq!(second.body["pageInfo"]["hasPreviousPage"], true);
    assert_eq!(second.body["pageInfo"]["hasNextPage"], false);
}

#[tokio::test]
async fn test_list_caps_page_size() {
    let fixture = TestFixture::new().await;
    let names: Vec<(u32, String)> = (1..=120).map(|i| (i, format!("mon-{}", i))).collect();
    let refs: Vec<(u32, &str)> = names.iter().map(|(i, n)| (*i, n.as_str())).collect();
    fixture.add_pokemon(&refs).await;
    fixture.load_index().await;

    let response = fixture.get("/api/v1/pokemon?first=500").await;

    assert_eq!(response.body["edges"].as_array().unwrap().len(), 100);
    assert_eq!(response.body["totalCount"], 120);
    assert_eq!(response.body["pageInfo"]["hasNextPage"], true);
}

#[tokio::test]
async fn test_list_before_index_load_is_empty() {
    let fixture = TestFixture::new().await;
    fixture.add_pokemon(&[(1, "bulbasaur")]).await;

    let response = fixture.get("/api/v1/pokemon").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["edges"].as_array().unwrap().len(), 0);
    assert_eq!(response.body["totalCount"], 0);
    assert!(response.body["pageInfo"]["startCursor"].is_null());
}

#[tokio::test]
async fn test_list_drops_failing_item() {
    let fixture = TestFixture::new().await;
    fixture.add_pokemon(&[(1, "pikachu"), (2, "charizard")]).await;
    fixture.load_index().await;
    fixture.client.fail_everywhere(2).await;

    let response = fixture.get("/api/v1/pokemon?first=2").await;

    assert_status!(response, StatusCode::OK);
    let edges = response.body["edges"].as_array().unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0]["node"]["id"], 1);
    assert_eq!(response.body["totalCount"], 2);
}

#[tokio::test]
async fn test_index_window() {
    let fixture = TestFixture::new().await;
    fixture
        .add_pokemon(&[(3, "venusaur"), (1, "bulbasaur"), (2, "ivysaur")])
        .await;
    fixture.load_index().await;

    let response = fixture.get("/api/v1/index?limit=2&offset=1").await;

    assert_status!(response, StatusCode::OK);
    let items = response.body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], 2);
    assert_eq!(items[1]["id"], 3);
    assert_eq!(items[0]["sourceUrl"], fixtures::pokemon_url(2));
    assert_eq!(response.body["totalCount"], 3);
    // No detail calls for the raw index
    assert_eq!(fixture.client.call_count().await, 0);
}

// =============================================================================
// Details
// =============================================================================

#[tokio::test]
async fn test_get_details() {
    let fixture = TestFixture::new().await;
    fixture.add_pokemon(&[(25, "pikachu")]).await;
    fixture.load_index().await;

    let response = fixture.get("/api/v1/pokemon/25").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["name"], "pikachu");
    assert_eq!(response.body["number"], 25);
    assert_eq!(response.body["moves"][0]["levelLearnedAt"], 1);
    assert_eq!(response.body["abilities"][0]["isHidden"], false);
}

#[tokio::test]
async fn test_get_details_not_found() {
    let fixture = TestFixture::new().await;
    fixture.add_pokemon(&[(25, "pikachu")]).await;
    fixture.load_index().await;

    let response = fixture.get("/api/v1/pokemon/9999").await;

    assert_status!(response, StatusCode::NOT_FOUND);
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_get_details_upstream_failure_is_bad_gateway() {
    let fixture = TestFixture::new().await;
    fixture.add_pokemon(&[(25, "pikachu")]).await;
    fixture.load_index().await;
    fixture.client.fail_everywhere(25).await;

    let response = fixture.get("/api/v1/pokemon/25").await;

    assert_status!(response, StatusCode::BAD_GATEWAY);
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn test_search_previews() {
    let fixture = TestFixture::new().await;
    fixture
        .add_pokemon(&[(25, "pikachu"), (26, "raichu"), (1, "bulbasaur")])
        .await;
    fixture.load_index().await;

    let response = fixture.get("/api/v1/pokemon/search?query=CHU").await;

    assert_status!(response, StatusCode::OK);
    let hits = response.body.as_array().unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0]["name"], "pikachu");
    assert_eq!(
        hits[0]["imageUrl"],
        "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/25.png"
    );
    assert_eq!(fixture.client.call_count().await, 0);
}

#[tokio::test]
async fn test_search_blank_query() {
    let fixture = TestFixture::new().await;
    fixture.add_pokemon(&[(25, "pikachu")]).await;
    fixture.load_index().await;

    let response = fixture.get("/api/v1/pokemon/search?query=%20%20").await;
    assert_eq!(response.body.as_array().unwrap().len(), 0);

    let response = fixture.get("/api/v1/pokemon/search").await;
    assert_eq!(response.body.as_array().unwrap().len(), 0);
}

// =============================================================================
// Auth and rate limiting
// =============================================================================

#[tokio::test]
async fn test_api_key_required_for_catalog_routes() {
    let fixture = TestFixture::with_config(TestConfig::with_api_key("secret")).await;

    let response = fixture.get("/api/v1/pokemon").await;
    assert_status!(response, StatusCode::UNAUTHORIZED);

    let response = fixture
        .get_with_headers("/api/v1/pokemon", &[("Authorization", "Bearer secret")])
        .await;
    assert_status!(response, StatusCode::OK);

    // Health stays open
    let response = fixture.get("/api/v1/health").await;
    assert_status!(response, StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_rejects_after_budget() {
    let fixture = TestFixture::with_config(TestConfig::with_rate_limit(2)).await;
    let client = [("X-Forwarded-For", "203.0.113.9")];

    let first = fixture.get_with_headers("/api/v1/pokemon", &client).await;
    assert_status!(first, StatusCode::OK);
    assert_eq!(first.headers["x-ratelimit-remaining"], "1");

    fixture.get_with_headers("/api/v1/pokemon", &client).await;
    let third = fixture.get_with_headers("/api/v1/pokemon", &client).await;

    assert_status!(third, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        third.body["errors"][0]["extensions"]["code"],
        "RATE_LIMIT_EXCEEDED"
    );
    assert_eq!(third.body["errors"][0]["extensions"]["httpStatus"], 429);
    assert!(third.headers.contains_key("x-ratelimit-retry-after"));

    // Another client has its own budget
    let other = fixture
        .get_with_headers("/api/v1/pokemon", &[("X-Forwarded-For", "198.51.100.1")])
        .await;
    assert_status!(other, StatusCode::OK);

    // Health is not rate limited
    let health = fixture.get_with_headers("/api/v1/health", &client).await;
    assert_status!(health, StatusCode::OK);
}
