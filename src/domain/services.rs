//! Remote service contracts consumed by the synchronization core.
//!
//! The orchestrator and the favorites engine only see these traits; the HTTP
//! implementation lives in `infrastructure::pokemon_remote`, the in-memory one in
//! `infrastructure::fixture_remote`.

use async_trait::async_trait;

use crate::domain::damage_relations::DamageRelations;
use crate::domain::errors::SyncResult;
use crate::domain::listing::PageListing;
use crate::domain::payload::RawItem;

/// Catalog (read-only) backend
#[async_trait]
pub trait CatalogRemote: Send + Sync {
    /// One page of item references plus the authoritative total count
    async fn fetch_listing(&self, limit: u32, offset: u32) -> SyncResult<PageListing>;

    /// Detail payload behind an item reference's lookup handle
    async fn fetch_item(&self, detail_url: &str) -> SyncResult<RawItem>;

    /// Damage relations of one type (by name or id)
    async fn fetch_damage_relations(&self, type_name: &str) -> SyncResult<DamageRelations>;
}

/// Favorites (read-write) backend
#[async_trait]
pub trait FavoritesRemote: Send + Sync {
    async fn fetch_favorite_ids(&self) -> SyncResult<Vec<u32>>;

    async fn fetch_favorite_item(&self, id: u32) -> SyncResult<RawItem>;

    /// Resolves only once the store has confirmed the insertion
    async fn add_favorite(&self, id: u32) -> SyncResult<()>;

    /// Returns the authoritative remaining id set after the deletion
    async fn remove_favorite(&self, id: u32) -> SyncResult<Vec<u32>>;
}
