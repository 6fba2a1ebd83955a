//! Catalog query handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use pokedex_core::{CatalogError, DetailRecord, Page, PageResult, SearchPreview, SortKey};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub first: Option<usize>,
    pub after: Option<String>,
    pub sort_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IndexParams {
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
    pub sort_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn catalog_error(err: CatalogError) -> ApiError {
    let status = match &err {
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/pokemon
///
/// Cursor-paginated page of hydrated records. Never fails because of a single
/// upstream item.
pub async fn list_pokemon(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Json<Page> {
    let catalog = state.catalog();
    let limit = catalog.page_size(params.first);
    let sort = SortKey::parse(params.sort_by.as_deref());

    Json(
        catalog
            .get_hydrated_page(limit, params.after.as_deref(), sort)
            .await,
    )
}

/// GET /api/v1/pokemon/{id}
pub async fn get_pokemon(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<DetailRecord>, ApiError> {
    state.catalog().get_details(id).await.map(Json).map_err(|e| {
        if !matches!(e, CatalogError::NotFound(_)) {
            warn!(id, error = %e, "Detail lookup failed");
        }
        catalog_error(e)
    })
}

/// GET /api/v1/pokemon/search
///
/// Previews built from the index alone.
pub async fn search_pokemon(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<SearchPreview>> {
    Json(state.catalog().search_previews(&params.query))
}

/// GET /api/v1/index
///
/// Offset window of the sorted index, without hydration.
pub async fn list_index(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IndexParams>,
) -> Json<PageResult> {
    let catalog = state.catalog();
    let limit = catalog.page_size(params.limit);
    let sort = SortKey::parse(params.sort_by.as_deref());

    Json(catalog.get_page(limit, params.offset, sort))
}
