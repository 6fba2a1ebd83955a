//! Read-through cache of detail records.
//!
//! Entries are created on the first successful fetch and never evicted. The
//! map holds at most one record per catalog id, so its size is bounded by the
//! catalog (about 1300 entries).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::index::IndexStore;
use super::retry::{RetryPolicy, RetryState};
use super::types::DetailRecord;
use super::{CatalogClient, CatalogError};
use crate::metrics::{record_upstream, CACHE_LOOKUPS, FALLBACK_ATTEMPTS};

pub struct DetailCache {
    entries: RwLock<HashMap<u32, DetailRecord>>,
    client: Arc<dyn CatalogClient>,
    index: Arc<IndexStore>,
    policy: RetryPolicy,
}

impl DetailCache {
    pub fn new(client: Arc<dyn CatalogClient>, index: Arc<IndexStore>, policy: RetryPolicy) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            client,
            index,
            policy,
        }
    }

    /// Resolve a detail record, going upstream only on a miss.
    ///
    /// A miss runs the retry policy against the by-id endpoint, then falls
    /// back once to the entry's listing URL if the index knows the id.
    /// Concurrent misses for the same id each go upstream.
    pub async fn get(&self, id: u32) -> Result<DetailRecord, CatalogError> {
        if let Some(hit) = self.peek(id).await {
            CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
            return Ok(hit);
        }
        CACHE_LOOKUPS.with_label_values(&["miss"]).inc();

        let client = self.client.as_ref();
        let what = format!("pokemon {}", id);
        let primary = self
            .policy
            .run(&what, || async move {
                let result = client.fetch_by_id(id).await;
                record_upstream("by_id", &result);
                result
            })
            .await;

        let detail = match primary {
            Ok(detail) => detail,
            Err(primary_err) => self.fall_back(id, primary_err).await?,
        };

        self.insert(id, detail.clone()).await;
        Ok(detail)
    }

    async fn fall_back(&self, id: u32, primary_err: CatalogError) -> Result<DetailRecord, CatalogError> {
        let Some(entry) = self.index.find(id) else {
            return Err(match primary_err {
                CatalogError::ApiError { status: 404, .. } => {
                    CatalogError::NotFound(format!("pokemon {}", id))
                }
                other => other,
            });
        };

        debug!(
            id,
            state = RetryState::FallingBack.as_str(),
            url = %entry.source_url,
            error = %primary_err,
            "Primary fetch failed, falling back to listing URL"
        );

        let result = self.client.fetch_by_url(&entry.source_url).await;
        record_upstream("by_url", &result);
        match result {
            Ok(detail) => {
                FALLBACK_ATTEMPTS.with_label_values(&["success"]).inc();
                Ok(detail)
            }
            Err(e) => {
                FALLBACK_ATTEMPTS.with_label_values(&["failure"]).inc();
                warn!(id, name = %entry.name, error = %e, "Fallback fetch failed");
                Err(e)
            }
        }
    }

    /// Cached record for `id`, without any I/O.
    pub async fn peek(&self, id: u32) -> Option<DetailRecord> {
        self.entries.read().await.get(&id).cloned()
    }

    /// Store a record under the id it was requested by. A later write for
    /// the same id replaces the earlier one.
    pub async fn insert(&self, id: u32, detail: DetailRecord) {
        self.entries.write().await.insert(id, detail);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
