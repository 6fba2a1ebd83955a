//! PokeAPI REST client.
//!
//! PokeAPI is public and needs no key. Listing lives at `/pokemon?limit&offset`,
//! details at `/pokemon/{id}`; listing entries carry the detail URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use super::types::{Ability, CatalogListing, DetailRecord, Form, ListingItem, Move};
use super::{CatalogClient, CatalogError};
use crate::config::UpstreamConfig;

/// PokeAPI client.
pub struct PokeApiClient {
    client: Client,
    base_url: String,
}

impl PokeApiClient {
    /// Create a new PokeAPI client.
    pub fn new(config: &UpstreamConfig) -> Result<Self, CatalogError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(CatalogError::NotConfigured(
                "upstream base_url is required".to_string(),
            ));
        }

        let client = Client::builder()
            .user_agent(concat!("pokedex-cache/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Listing URLs are absolute; tolerate relative ones too.
    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.base_url, url.trim_start_matches('/'))
        }
    }

    async fn get_detail(&self, url: &str, what: &str) -> Result<DetailRecord, CatalogError> {
        let response = self.client.get(url).send().await?;
        let response = check_status(response, what).await?;

        let detail: PokemonResponse = response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse pokemon response: {}", e))
        })?;

        Ok(detail.into())
    }
}

#[async_trait]
impl CatalogClient for PokeApiClient {
    async fn fetch_list(&self, limit: u32, offset: u32) -> Result<CatalogListing, CatalogError> {
        let url = format!("{}/pokemon", self.base_url);

        debug!(limit, offset, "PokeAPI list");

        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;
        let response = check_status(response, "pokemon list").await?;

        let listing: ListResponse = response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse list response: {}", e))
        })?;

        Ok(CatalogListing {
            count: listing.count,
            results: listing
                .results
                .into_iter()
                .map(|item| ListingItem {
                    name: item.name,
                    url: item.url,
                })
                .collect(),
        })
    }

    async fn fetch_by_id(&self, id: u32) -> Result<DetailRecord, CatalogError> {
        let url = format!("{}/pokemon/{}", self.base_url, id);
        debug!(id, "PokeAPI get pokemon");
        self.get_detail(&url, &format!("pokemon {}", id)).await
    }

    async fn fetch_by_url(&self, url: &str) -> Result<DetailRecord, CatalogError> {
        let url = self.resolve(url);
        debug!(url = %url, "PokeAPI get pokemon by url");
        self.get_detail(&url, &url).await
    }
}

/// Turn non-success statuses into errors the retry policy can classify.
async fn check_status(response: Response, what: &str) -> Result<Response, CatalogError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == 404 {
        return Err(CatalogError::NotFound(what.to_string()));
    }
    let body = response.text().await.unwrap_or_default();
    Err(CatalogError::ApiError {
        status: status.as_u16(),
        message: body,
    })
}

// ============================================================================
// PokeAPI Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListResponse {
    count: u32,
    #[serde(default)]
    results: Vec<ListItem>,
}

#[derive(Debug, Deserialize)]
struct ListItem {
    name: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct PokemonResponse {
    id: u32,
    name: String,
    #[serde(default)]
    sprites: Sprites,
    #[serde(default)]
    abilities: Vec<AbilitySlot>,
    #[serde(default)]
    moves: Vec<MoveSlot>,
    #[serde(default)]
    forms: Vec<NamedResource>,
}

#[derive(Debug, Default, Deserialize)]
struct Sprites {
    front_default: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AbilitySlot {
    ability: NamedResource,
    #[serde(default)]
    is_hidden: bool,
}

#[derive(Debug, Deserialize)]
struct MoveSlot {
    #[serde(rename = "move")]
    move_: NamedResource,
    #[serde(default)]
    version_group_details: Vec<VersionGroupDetail>,
}

#[derive(Debug, Deserialize)]
struct VersionGroupDetail {
    level_learned_at: u32,
}

#[derive(Debug, Deserialize)]
struct NamedResource {
    name: String,
    #[serde(default)]
    url: String,
}

impl From<PokemonResponse> for DetailRecord {
    fn from(p: PokemonResponse) -> Self {
        Self {
            id: p.id,
            name: p.name,
            number: p.id,
            image_url: p.sprites.front_default.unwrap_or_default(),
            abilities: p
                .abilities
                .into_iter()
                .map(|a| Ability {
                    name: a.ability.name,
                    is_hidden: a.is_hidden,
                })
                .collect(),
            moves: p
                .moves
                .into_iter()
                .map(|m| Move {
                    name: m.move_.name,
                    level_learned_at: m.version_group_details.first().map(|d| d.level_learned_at),
                })
                .collect(),
            forms: p
                .forms
                .into_iter()
                .map(|f| Form {
                    name: f.name,
                    url: f.url,
                })
                .collect(),
        }
    }
}
