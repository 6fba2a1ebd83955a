//! Query surface over the index, cache and hydration pipeline.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::cache::DetailCache;
use super::cursor::{self, decode_cursor, encode_cursor};
use super::hydration::HydrationPipeline;
use super::index::IndexStore;
use super::retry::RetryPolicy;
use super::search::search_entries;
use super::types::{DetailRecord, IndexEntry, Page, PageResult, SearchPreview, SortKey};
use super::{CatalogClient, CatalogError};
use crate::config::Config;

/// Readiness numbers for the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogStatus {
    pub index_loaded: bool,
    pub index_size: usize,
    pub cached_details: usize,
    pub loaded_at: Option<DateTime<Utc>>,
}

pub struct CatalogService {
    client: Arc<dyn CatalogClient>,
    index: Arc<IndexStore>,
    cache: Arc<DetailCache>,
    pipeline: HydrationPipeline,
    index_limit: u32,
    default_page_size: usize,
    max_page_size: usize,
    max_search_results: usize,
    sprite_base_url: String,
}

impl CatalogService {
    pub fn new(client: Arc<dyn CatalogClient>, config: &Config) -> Self {
        let index = Arc::new(IndexStore::new());
        let cache = Arc::new(DetailCache::new(
            client.clone(),
            index.clone(),
            RetryPolicy::from(&config.hydration),
        ));
        let pipeline = HydrationPipeline::new(cache.clone(), config.hydration.max_parallel_fetches);

        Self {
            client,
            index,
            cache,
            pipeline,
            index_limit: config.upstream.index_limit,
            default_page_size: config.hydration.default_page_size,
            max_page_size: config.hydration.max_page_size,
            max_search_results: config.search.max_results,
            sprite_base_url: config.upstream.sprite_base_url.clone(),
        }
    }

    /// Load the index once, in the background. Failure is logged and the
    /// service keeps answering from an empty index. Not retried.
    pub fn spawn_index_load(self: &Arc<Self>) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = service.load_index().await {
                warn!(error = %e, "Catalog index unavailable, serving an empty catalog");
            }
        })
    }

    /// Load the index and wait for it.
    pub async fn load_index(&self) -> Result<usize, CatalogError> {
        self.index.load(self.client.as_ref(), self.index_limit).await
    }

    pub fn index(&self) -> &IndexStore {
        &self.index
    }

    pub async fn status(&self) -> CatalogStatus {
        let snapshot = self.index.snapshot();
        CatalogStatus {
            index_loaded: snapshot.loaded_at().is_some(),
            index_size: snapshot.len(),
            cached_details: self.cache.len().await,
            loaded_at: snapshot.loaded_at(),
        }
    }

    /// Full record for one id, after retry and fallback.
    pub async fn get_details(&self, id: u32) -> Result<DetailRecord, CatalogError> {
        debug!(id, "Get details");
        self.cache.get(id).await
    }

    /// Un-hydrated window of the sorted index.
    pub fn get_page(&self, limit: usize, offset: usize, sort: SortKey) -> PageResult {
        let sorted = self.index.sorted_view(sort);
        let (items, total_count) = cursor::slice(&sorted, limit, offset);
        PageResult { items, total_count }
    }

    /// Hydrated page starting right after `after`.
    ///
    /// A missing or undecodable cursor starts from the top.
    pub async fn get_hydrated_page(&self, limit: usize, after: Option<&str>, sort: SortKey) -> Page {
        let offset = match decode_cursor(after) {
            Some(position) => position.saturating_add(1),
            None => {
                if after.is_some() {
                    debug!(cursor = ?after, "Ignoring malformed cursor");
                }
                0
            }
        };

        let sorted = self.index.sorted_view(sort);
        self.pipeline.hydrate_page(&sorted, limit, offset).await
    }

    /// Requested page size, defaulted and capped.
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .min(self.max_page_size)
    }

    pub fn search(&self, query: &str) -> Vec<IndexEntry> {
        let snapshot = self.index.snapshot();
        search_entries(snapshot.entries(), query, self.max_search_results)
    }

    /// Search hits rendered straight from the index, without upstream calls.
    pub fn search_previews(&self, query: &str) -> Vec<SearchPreview> {
        self.search(query)
            .iter()
            .map(|entry| SearchPreview::from_entry(entry, &self.sprite_base_url))
            .collect()
    }

    pub fn encode_cursor(&self, offset: usize) -> String {
        encode_cursor(offset)
    }

    pub fn decode_cursor(&self, cursor: Option<&str>) -> Option<usize> {
        decode_cursor(cursor)
    }
}
