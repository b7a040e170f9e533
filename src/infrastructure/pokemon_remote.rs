//! HTTP implementation of the catalog and favorites contracts.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::domain::damage_relations::DamageRelations;
use crate::domain::errors::{SyncError, SyncResult};
use crate::domain::listing::PageListing;
use crate::domain::payload::{RawItem, TypeDetails};
use crate::domain::services::{CatalogRemote, FavoritesRemote};
use crate::infrastructure::config::{AdvancedConfig, utils};
use crate::infrastructure::http_client::{HttpClient, HttpClientConfig};

/// Talks to the public catalog service and the local favorites store
#[derive(Clone)]
pub struct PokemonRemote {
    catalog: HttpClient,
    favorites: HttpClient,
    catalog_base: Url,
    favorites_base: Url,
}

impl PokemonRemote {
    pub fn new(http: HttpClient, catalog_base: Url, favorites_base: Url) -> Self {
        Self {
            catalog: http.clone().with_context_label("catalog"),
            favorites: http.with_context_label("favorites"),
            catalog_base,
            favorites_base,
        }
    }

    pub fn from_config(advanced: &AdvancedConfig) -> anyhow::Result<Self> {
        let http = HttpClient::with_config(HttpClientConfig::from_advanced_config(advanced))?;
        Ok(Self::new(
            http,
            utils::base_url(&advanced.catalog_base_url)?,
            utils::base_url(&advanced.favorites_base_url)?,
        ))
    }

    pub fn catalog_base(&self) -> &Url {
        &self.catalog_base
    }

    pub fn favorites_base(&self) -> &Url {
        &self.favorites_base
    }
}

/// URL construction failures only happen for malformed handles or names
fn endpoint(result: anyhow::Result<Url>) -> SyncResult<Url> {
    result.map_err(|e| SyncError::Validation(format!("invalid endpoint: {}", e)))
}

#[async_trait]
impl CatalogRemote for PokemonRemote {
    async fn fetch_listing(&self, limit: u32, offset: u32) -> SyncResult<PageListing> {
        let url = endpoint(utils::listing_url(&self.catalog_base, limit, offset))?;
        self.catalog.get_json(&url).await
    }

    async fn fetch_item(&self, detail_url: &str) -> SyncResult<RawItem> {
        let url = Url::parse(detail_url)
            .map_err(|e| SyncError::Validation(format!("invalid detail url {}: {}", detail_url, e)))?;
        let body = self.catalog.get_value(&url).await?;
        debug!("Fetched detail payload from {}", url);
        RawItem::from_value(body)
    }

    async fn fetch_damage_relations(&self, type_name: &str) -> SyncResult<DamageRelations> {
        if type_name.is_empty() || type_name.contains('/') {
            return Err(SyncError::Validation(format!("invalid type name: {:?}", type_name)));
        }
        let url = endpoint(utils::type_url(&self.catalog_base, type_name))?;
        let details: TypeDetails = self.catalog.get_json(&url).await?;
        Ok(details.damage_relations.into())
    }
}

#[async_trait]
impl FavoritesRemote for PokemonRemote {
    async fn fetch_favorite_ids(&self) -> SyncResult<Vec<u32>> {
        let url = endpoint(utils::favorites_url(&self.favorites_base))?;
        self.favorites.get_json(&url).await
    }

    async fn fetch_favorite_item(&self, id: u32) -> SyncResult<RawItem> {
        let url = endpoint(utils::favorite_item_url(&self.favorites_base, id))?;
        RawItem::from_value(self.favorites.get_value(&url).await?)
    }

    async fn add_favorite(&self, id: u32) -> SyncResult<()> {
        let url = endpoint(utils::favorites_url(&self.favorites_base))?;
        self.favorites.post_json(&url, &json!({ "id": id })).await
    }

    async fn remove_favorite(&self, id: u32) -> SyncResult<Vec<u32>> {
        let url = endpoint(utils::favorite_url(&self.favorites_base, id))?;
        self.favorites.delete_json(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> PokemonRemote {
        PokemonRemote::from_config(&AdvancedConfig::default()).unwrap()
    }

    #[test]
    fn bases_come_from_config() {
        let advanced = AdvancedConfig {
            favorites_base_url: "http://127.0.0.1:8080".to_string(),
            ..AdvancedConfig::default()
        };
        let remote = PokemonRemote::from_config(&advanced).unwrap();
        assert_eq!(remote.favorites_base().as_str(), "http://127.0.0.1:8080/");
        assert_eq!(remote.catalog_base().as_str(), "https://pokeapi.co/api/v2/");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let advanced = AdvancedConfig {
            catalog_base_url: "not a url".to_string(),
            ..AdvancedConfig::default()
        };
        assert!(PokemonRemote::from_config(&advanced).is_err());
    }

    #[test]
    fn malformed_handles_fail_validation_without_io() {
        let remote = remote();
        tokio_test::block_on(async {
            assert!(matches!(
                remote.fetch_item("::nope").await,
                Err(SyncError::Validation(_))
            ));
            assert!(matches!(
                remote.fetch_damage_relations("").await,
                Err(SyncError::Validation(_))
            ));
            assert!(matches!(
                remote.fetch_damage_relations("../pokemon").await,
                Err(SyncError::Validation(_))
            ));
        });
    }
}
