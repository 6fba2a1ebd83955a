//! Concurrent hydration of index entries into detail records.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use super::cache::DetailCache;
use super::cursor::{encode_cursor, slice};
use super::retry::RetryState;
use super::types::{DetailRecord, Edge, IndexEntry, Page, PageInfo};
use crate::metrics::{HYDRATION_DROPPED, HYDRATION_DURATION};

/// Result of hydrating one ordered batch of entries.
#[derive(Debug, Default)]
pub struct HydrationOutcome {
    /// Resolved records tagged with their position in the input, in order.
    pub resolved: Vec<(usize, DetailRecord)>,
    /// Entries whose every fetch path failed.
    pub dropped: Vec<IndexEntry>,
}

pub struct HydrationPipeline {
    cache: Arc<DetailCache>,
    max_parallel_fetches: usize,
}

impl HydrationPipeline {
    pub fn new(cache: Arc<DetailCache>, max_parallel_fetches: usize) -> Self {
        Self {
            cache,
            max_parallel_fetches: max_parallel_fetches.max(1),
        }
    }

    /// Resolve every entry through the cache, at most `max_parallel_fetches`
    /// at a time. One item failing never affects its siblings.
    pub async fn hydrate(&self, entries: &[IndexEntry]) -> HydrationOutcome {
        let cache = self.cache.as_ref();

        let mut results: Vec<(usize, &IndexEntry, _)> = stream::iter(entries.iter().enumerate())
            .map(|(position, entry)| async move {
                let result = cache.get(entry.id).await;
                (position, entry, result)
            })
            .buffer_unordered(self.max_parallel_fetches)
            .boxed()
            .collect()
            .await;

        results.sort_by_key(|(position, _, _)| *position);

        let mut outcome = HydrationOutcome::default();
        for (position, entry, result) in results {
            match result {
                Ok(detail) => outcome.resolved.push((position, detail)),
                Err(e) => {
                    warn!(
                        id = entry.id,
                        name = %entry.name,
                        state = RetryState::Dropped.as_str(),
                        error = %e,
                        "Failed to fetch Pokemon {} ({})",
                        entry.id,
                        entry.name
                    );
                    HYDRATION_DROPPED.inc();
                    outcome.dropped.push(entry.clone());
                }
            }
        }
        outcome
    }

    /// Slice `sorted` at `offset`, hydrate the window and wrap it in a page.
    pub async fn hydrate_page(&self, sorted: &[IndexEntry], limit: usize, offset: usize) -> Page {
        let _timer = HYDRATION_DURATION.start_timer();

        let (window, total_count) = slice(sorted, limit, offset);
        let outcome = self.hydrate(&window).await;

        debug!(
            offset,
            limit,
            resolved = outcome.resolved.len(),
            dropped = outcome.dropped.len(),
            "Hydrated page"
        );

        build_page(outcome, offset, limit, total_count)
    }
}

/// Assemble a page from hydrated records.
///
/// Edge cursors encode `offset + position`, so a dropped item leaves a gap in
/// cursor values but never shifts its neighbours.
pub fn build_page(outcome: HydrationOutcome, offset: usize, limit: usize, total_count: usize) -> Page {
    let edges: Vec<Edge> = outcome
        .resolved
        .into_iter()
        .map(|(position, node)| Edge {
            node,
            cursor: encode_cursor(offset.saturating_add(position)),
        })
        .collect();

    let page_info = PageInfo {
        has_next_page: offset.saturating_add(limit) < total_count,
        has_previous_page: offset > 0,
        start_cursor: edges.first().map(|e| e.cursor.clone()),
        end_cursor: edges.last().map(|e| e.cursor.clone()),
    };

    Page {
        edges,
        page_info,
        total_count,
    }
}
