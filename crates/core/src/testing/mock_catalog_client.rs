//! Mock upstream catalog for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::fixtures;
use crate::catalog::{
    parse_id_from_url, CatalogClient, CatalogError, CatalogListing, DetailRecord, ListingItem,
};

/// A recorded upstream call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCatalogCall {
    FetchList { limit: u32, offset: u32 },
    FetchById { id: u32 },
    FetchByUrl { url: String },
}

type ErrorFactory = Arc<dyn Fn() -> CatalogError + Send + Sync>;

/// Fail the next `remaining` calls with whatever `make` builds.
#[derive(Clone)]
struct ScriptedFailure {
    remaining: u32,
    make: ErrorFactory,
}

impl ScriptedFailure {
    fn take(&mut self) -> Option<CatalogError> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some((self.make)())
    }
}

/// Mock implementation of the CatalogClient trait.
///
/// Provides controllable behavior for testing:
/// - Serve a listing and detail records added through [`add_pokemon`](Self::add_pokemon)
/// - Script failures per id or per URL, for a number of calls
/// - Track calls and peak concurrency for assertions
///
/// # Example
///
/// ```rust,ignore
/// use pokedex_core::testing::{MockCatalogClient, fixtures};
///
/// let client = MockCatalogClient::new();
/// client.add_pokemon(fixtures::pokemon(25, "pikachu")).await;
///
/// // First two by-id calls answer 503, the third succeeds.
/// client.fail_by_id(25, 2, fixtures::server_error).await;
/// ```
pub struct MockCatalogClient {
    /// Listing entries in upstream order.
    listing: Arc<RwLock<Vec<ListingItem>>>,
    /// Detail records by id.
    details: Arc<RwLock<HashMap<u32, DetailRecord>>>,
    by_id_failures: Arc<RwLock<HashMap<u32, ScriptedFailure>>>,
    by_url_failures: Arc<RwLock<HashMap<String, ScriptedFailure>>>,
    fail_listing: Arc<RwLock<bool>>,
    /// Simulated latency for detail calls.
    latency: Arc<RwLock<Option<Duration>>>,
    calls: Arc<RwLock<Vec<RecordedCatalogCall>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl Default for MockCatalogClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalogClient {
    /// Create a new empty mock catalog.
    pub fn new() -> Self {
        Self {
            listing: Arc::new(RwLock::new(Vec::new())),
            details: Arc::new(RwLock::new(HashMap::new())),
            by_id_failures: Arc::new(RwLock::new(HashMap::new())),
            by_url_failures: Arc::new(RwLock::new(HashMap::new())),
            fail_listing: Arc::new(RwLock::new(false)),
            latency: Arc::new(RwLock::new(None)),
            calls: Arc::new(RwLock::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    // =========================================================================
    // Catalog Configuration
    // =========================================================================

    /// Add a record to both the listing and the detail endpoints.
    pub async fn add_pokemon(&self, detail: DetailRecord) {
        self.add_pokemon_at(detail.id, detail).await;
    }

    /// Serve `detail` at `id`, even when the record carries another id.
    pub async fn add_pokemon_at(&self, id: u32, detail: DetailRecord) {
        self.listing.write().await.push(ListingItem {
            name: detail.name.clone(),
            url: fixtures::pokemon_url(id),
        });
        self.details.write().await.insert(id, detail);
    }

    /// Add a raw listing entry without a detail record behind it.
    pub async fn add_listing_item(&self, name: &str, url: &str) {
        self.listing.write().await.push(ListingItem {
            name: name.to_string(),
            url: url.to_string(),
        });
    }

    /// Make every listing call fail with a 503.
    pub async fn fail_listing(&self, fail: bool) {
        *self.fail_listing.write().await = fail;
    }

    /// Delay every detail call by `latency`.
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = Some(latency);
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Fail the next `times` by-id calls for `id`. `u32::MAX` means always.
    pub async fn fail_by_id<F>(&self, id: u32, times: u32, make: F)
    where
        F: Fn() -> CatalogError + Send + Sync + 'static,
    {
        self.by_id_failures.write().await.insert(
            id,
            ScriptedFailure {
                remaining: times,
                make: Arc::new(make),
            },
        );
    }

    /// Fail the next `times` by-URL calls for `url`. `u32::MAX` means always.
    pub async fn fail_by_url<F>(&self, url: &str, times: u32, make: F)
    where
        F: Fn() -> CatalogError + Send + Sync + 'static,
    {
        self.by_url_failures.write().await.insert(
            url.to_string(),
            ScriptedFailure {
                remaining: times,
                make: Arc::new(make),
            },
        );
    }

    /// Fail every path for `id`: by-id and the fallback URL.
    pub async fn fail_everywhere(&self, id: u32) {
        self.fail_by_id(id, u32::MAX, fixtures::server_error).await;
        self.fail_by_url(&fixtures::pokemon_url(id), u32::MAX, fixtures::server_error)
            .await;
    }

    // =========================================================================
    // Call Recording
    // =========================================================================

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedCatalogCall> {
        self.calls.read().await.clone()
    }

    /// Clear recorded calls and the concurrency high-water mark.
    pub async fn clear_recorded(&self) {
        self.calls.write().await.clear();
        self.max_in_flight.store(0, Ordering::SeqCst);
    }

    /// Get the number of calls performed.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    pub async fn by_id_calls(&self, id: u32) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, RecordedCatalogCall::FetchById { id: i } if *i == id))
            .count()
    }

    pub async fn by_url_calls(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, RecordedCatalogCall::FetchByUrl { .. }))
            .count()
    }

    /// Highest number of detail calls observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn record(&self, call: RecordedCatalogCall) {
        self.calls.write().await.push(call);
    }

    async fn simulate_latency(&self) {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let latency = *self.latency.read().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    async fn lookup(&self, id: Option<u32>, what: &str) -> Result<DetailRecord, CatalogError> {
        let details = self.details.read().await;
        id.and_then(|id| details.get(&id).cloned())
            .ok_or_else(|| CatalogError::NotFound(what.to_string()))
    }
}

#[async_trait]
impl CatalogClient for MockCatalogClient {
    async fn fetch_list(&self, limit: u32, offset: u32) -> Result<CatalogListing, CatalogError> {
        self.record(RecordedCatalogCall::FetchList { limit, offset }).await;

        if *self.fail_listing.read().await {
            return Err(fixtures::server_error());
        }

        let listing = self.listing.read().await;
        Ok(CatalogListing {
            count: listing.len() as u32,
            results: listing
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect(),
        })
    }

    async fn fetch_by_id(&self, id: u32) -> Result<DetailRecord, CatalogError> {
        self.record(RecordedCatalogCall::FetchById { id }).await;
        self.simulate_latency().await;

        let scripted = self
            .by_id_failures
            .write()
            .await
            .get_mut(&id)
            .and_then(|f| f.take());
        if let Some(err) = scripted {
            return Err(err);
        }

        self.lookup(Some(id), &format!("pokemon {}", id)).await
    }

    async fn fetch_by_url(&self, url: &str) -> Result<DetailRecord, CatalogError> {
        self.record(RecordedCatalogCall::FetchByUrl {
            url: url.to_string(),
        })
        .await;
        self.simulate_latency().await;

        let scripted = self
            .by_url_failures
            .write()
            .await
            .get_mut(url)
            .and_then(|f| f.take());
        if let Some(err) = scripted {
            return Err(err);
        }

        self.lookup(parse_id_from_url(url), url).await
    }
}
