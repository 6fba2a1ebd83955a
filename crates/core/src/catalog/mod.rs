//! Read-through front for the upstream PokeAPI catalog.
//!
//! The upstream lists ~1300 entries and needs one extra round-trip per entry
//! for details. This module keeps a lightweight index of the whole catalog in
//! memory, caches details as they are fetched, and hydrates pages of the
//! index concurrently with a per-item retry/fallback policy.
//!
//! Request path:
//!
//! 1. [`IndexStore::sorted_view`] orders the current snapshot.
//! 2. [`cursor::slice`] cuts the requested window.
//! 3. [`HydrationPipeline::hydrate`] resolves every entry through the
//!    [`DetailCache`], which talks to the [`CatalogClient`] on a miss.
//! 4. Results are put back in slice order and wrapped in a [`Page`].

mod cache;
pub mod cursor;
mod hydration;
mod index;
mod pokeapi;
mod retry;
mod search;
mod service;
mod types;

pub use cache::DetailCache;
pub use cursor::{decode_cursor, encode_cursor};
pub use hydration::{HydrationOutcome, HydrationPipeline};
pub use index::{parse_id_from_url, IndexSnapshot, IndexStore};
pub use pokeapi::PokeApiClient;
pub use retry::{RetryPolicy, RetryState, MAX_BACKOFF};
pub use search::search_entries;
pub use service::{CatalogService, CatalogStatus};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the upstream catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Transport-level failure (DNS, connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("Upstream error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Upstream has no such resource, or the id is unknown and has no locator.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Upstream answered 2xx with a body we could not decode.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client could not be built from its configuration.
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// How the retry policy should treat a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Server-side or transport trouble. Worth retrying.
    Transient,
    /// Client-side or malformed-response trouble. Retrying will not help.
    Permanent,
}

impl CatalogError {
    pub fn class(&self) -> ErrorClass {
        match self {
            CatalogError::HttpError(e) if e.is_timeout() || e.is_connect() => ErrorClass::Transient,
            CatalogError::HttpError(e) => match e.status() {
                Some(status) if status.is_server_error() => ErrorClass::Transient,
                _ => ErrorClass::Permanent,
            },
            CatalogError::ApiError { status, .. } if (500..600).contains(status) => {
                ErrorClass::Transient
            }
            _ => ErrorClass::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    /// Short label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            CatalogError::HttpError(_) => "http_error",
            CatalogError::ApiError { .. } => "api_error",
            CatalogError::NotFound(_) => "not_found",
            CatalogError::ParseError(_) => "parse_error",
            CatalogError::NotConfigured(_) => "not_configured",
        }
    }
}

/// Upstream catalog contract the core depends on.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch one page of the listing endpoint.
    async fn fetch_list(&self, limit: u32, offset: u32) -> Result<CatalogListing, CatalogError>;

    /// Fetch the detail record for an id.
    async fn fetch_by_id(&self, id: u32) -> Result<DetailRecord, CatalogError>;

    /// Fetch the detail record through its listing URL.
    async fn fetch_by_url(&self, url: &str) -> Result<DetailRecord, CatalogError>;
}
