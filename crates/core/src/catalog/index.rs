//! In-memory index of the whole catalog.
//!
//! Readers load the current [`IndexSnapshot`] without locking. The one-shot
//! loader builds a complete replacement off to the side and publishes it with
//! a single pointer swap, so nobody ever observes a half-built list.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use super::types::{CatalogListing, IndexEntry, SortKey};
use super::{CatalogClient, CatalogError};
use crate::metrics::{record_upstream, INDEX_LOADS, INDEX_SIZE};

/// Immutable, internally consistent view of the catalog.
#[derive(Debug, Default)]
pub struct IndexSnapshot {
    entries: Vec<IndexEntry>,
    by_id: HashMap<u32, usize>,
    loaded_at: Option<DateTime<Utc>>,
}

impl IndexSnapshot {
    /// Build a snapshot from a listing page.
    ///
    /// Entries whose URL does not end in a numeric segment are dropped, and so
    /// are repeated ids (first one wins). Both cases are logged.
    pub fn from_listing(listing: CatalogListing) -> Self {
        let mut entries = Vec::with_capacity(listing.results.len());
        let mut by_id = HashMap::with_capacity(listing.results.len());

        for item in listing.results {
            let Some(id) = parse_id_from_url(&item.url) else {
                warn!(name = %item.name, url = %item.url, "Dropping index entry with unparseable URL");
                continue;
            };
            if by_id.contains_key(&id) {
                warn!(id, name = %item.name, "Dropping duplicate index entry");
                continue;
            }
            by_id.insert(id, entries.len());
            entries.push(IndexEntry {
                id,
                name: item.name,
                source_url: item.url,
            });
        }

        Self {
            entries,
            by_id,
            loaded_at: Some(Utc::now()),
        }
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&IndexEntry> {
        self.by_id.get(&id).map(|&pos| &self.entries[pos])
    }

    /// When this snapshot was built. `None` for the initial empty snapshot.
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }
}

/// Holder of the currently published snapshot.
pub struct IndexStore {
    current: ArcSwap<IndexSnapshot>,
}

impl Default for IndexStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexStore {
    /// Create an empty store. Requests see an empty catalog until a load lands.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(IndexSnapshot::default()),
        }
    }

    /// Fetch the whole catalog in one listing call and publish it.
    ///
    /// On failure the previous snapshot stays in place and the error is
    /// logged and returned. Returns the number of entries now published.
    pub async fn load(&self, client: &dyn CatalogClient, limit: u32) -> Result<usize, CatalogError> {
        info!(limit, "Loading catalog index");

        let result = client.fetch_list(limit, 0).await;
        record_upstream("list", &result);
        let listing = match result {
            Ok(listing) => listing,
            Err(e) => {
                INDEX_LOADS.with_label_values(&["failure"]).inc();
                error!(error = %e, "Failed to load catalog index, serving the previous snapshot");
                return Err(e);
            }
        };

        let upstream_count = listing.count;
        let snapshot = IndexSnapshot::from_listing(listing);
        if (snapshot.len() as u64) < u64::from(upstream_count) {
            warn!(
                loaded = snapshot.len(),
                upstream_count,
                "Index holds fewer entries than the upstream reports"
            );
        }

        self.publish(snapshot);
        INDEX_LOADS.with_label_values(&["success"]).inc();
        let size = self.snapshot().len();
        info!(size, "Catalog index loaded");
        Ok(size)
    }

    /// Swap in a new snapshot. A snapshot smaller than the current one is
    /// refused so the index never shrinks. Returns whether it was published.
    pub fn publish(&self, snapshot: IndexSnapshot) -> bool {
        let current_len = self.current.load().len();
        if snapshot.len() < current_len {
            warn!(
                current = current_len,
                candidate = snapshot.len(),
                "Refusing to publish a smaller index snapshot"
            );
            return false;
        }

        INDEX_SIZE.set(snapshot.len() as i64);
        self.current.store(Arc::new(snapshot));
        true
    }

    /// Current snapshot. Never blocks.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.current.load_full()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.load().loaded_at.is_some()
    }

    /// Look up an entry by id in the current snapshot.
    pub fn find(&self, id: u32) -> Option<IndexEntry> {
        self.current.load().get(id).cloned()
    }

    /// Entries of the current snapshot in the requested order.
    pub fn sorted_view(&self, key: SortKey) -> Vec<IndexEntry> {
        let mut entries = self.snapshot().entries.clone();
        match key {
            SortKey::Number => entries.sort_by_key(|e| e.id),
            SortKey::Name => entries.sort_by(|a, b| a.name.cmp(&b.name)),
        }
        entries
    }
}

/// Parse the trailing numeric path segment of a listing URL.
///
/// `https://pokeapi.co/api/v2/pokemon/25/` gives `Some(25)`.
pub fn parse_id_from_url(url: &str) -> Option<u32> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
}
