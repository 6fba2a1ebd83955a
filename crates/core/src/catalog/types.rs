//! Data model shared by the index, the detail cache and the query surface.

use serde::{Deserialize, Serialize};

/// Lightweight catalog entry held by the in-memory index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub id: u32,
    pub name: String,
    /// Upstream detail URL. Its last path segment is the id.
    pub source_url: String,
}

/// Full record for one catalog item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetailRecord {
    pub id: u32,
    pub name: String,
    /// National dex number. Same as `id` for PokeAPI.
    pub number: u32,
    /// Front sprite, or empty when the upstream has none.
    pub image_url: String,
    #[serde(default)]
    pub abilities: Vec<Ability>,
    #[serde(default)]
    pub moves: Vec<Move>,
    #[serde(default)]
    pub forms: Vec<Form>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Ability {
    pub name: String,
    pub is_hidden: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_learned_at: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub name: String,
    pub url: String,
}

/// One page of the upstream listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogListing {
    pub count: u32,
    pub results: Vec<ListingItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingItem {
    pub name: String,
    pub url: String,
}

/// Ordering applied before slicing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Number,
    Name,
}

impl SortKey {
    /// `"name"` sorts by name; anything else, including nothing, sorts by number.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("name") => SortKey::Name,
            _ => SortKey::Number,
        }
    }
}

/// Un-hydrated slice of the sorted index.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub items: Vec<IndexEntry>,
    pub total_count: usize,
}

/// Cursor-paginated page of hydrated records.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub edges: Vec<Edge>,
    pub page_info: PageInfo,
    pub total_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Edge {
    pub node: DetailRecord,
    pub cursor: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

/// Search hit rendered from the index alone, without an upstream call.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchPreview {
    pub id: u32,
    pub name: String,
    pub number: u32,
    pub image_url: String,
}

impl SearchPreview {
    pub fn from_entry(entry: &IndexEntry, sprite_base_url: &str) -> Self {
        Self {
            id: entry.id,
            name: entry.name.clone(),
            number: entry.id,
            image_url: format!("{}/{}.png", sprite_base_url.trim_end_matches('/'), entry.id),
        }
    }
}
