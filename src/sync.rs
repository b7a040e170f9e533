//! Synchronization layer
//!
//! State containers, request tokens, the catalog orchestrator, the favorites
//! engine and the detail view, wired together by [`PokedexSync`].

pub mod catalog_orchestrator;
pub mod detail_view;
pub mod favorites_engine;
pub mod state;
pub mod tokens;

pub use catalog_orchestrator::CatalogOrchestrator;
pub use detail_view::{DetailView, DetailViewService};
pub use favorites_engine::{FavoritesEngine, ToggleOutcome};
pub use state::{CatalogSnapshot, CatalogStore, FavoritesState, FavoritesStore};
pub use tokens::RequestTokens;

use std::sync::Arc;
use tracing::debug;

use crate::domain::errors::SyncResult;
use crate::domain::pagination::Paginator;
use crate::domain::services::{CatalogRemote, FavoritesRemote};
use crate::infrastructure::config::{AppConfig, defaults};
use crate::types::{IntentOutcome, ShellIntent};

/// Tunables of the sync core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub page_size: u32,
    pub detail_max_concurrent: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: defaults::PAGE_SIZE,
            detail_max_concurrent: defaults::DETAIL_MAX_CONCURRENT,
        }
    }
}

impl SyncOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            page_size: config.user.page_size,
            detail_max_concurrent: config.advanced.detail_max_concurrent,
        }
    }
}

/// The two collections and every operation on them
pub struct PokedexSync {
    catalog: CatalogOrchestrator,
    favorites: FavoritesEngine,
    details: DetailViewService,
}

impl PokedexSync {
    pub fn new(
        catalog_remote: Arc<dyn CatalogRemote>,
        favorites_remote: Arc<dyn FavoritesRemote>,
        options: SyncOptions,
    ) -> Self {
        let catalog_store = Arc::new(CatalogStore::new());
        let favorites_store = Arc::new(FavoritesStore::new());

        Self {
            catalog: CatalogOrchestrator::new(
                Arc::clone(&catalog_remote),
                Arc::clone(&catalog_store),
                Paginator::new(options.page_size),
                options.detail_max_concurrent,
            ),
            favorites: FavoritesEngine::new(
                favorites_remote,
                Arc::clone(&favorites_store),
                options.detail_max_concurrent,
            ),
            details: DetailViewService::new(catalog_remote, catalog_store, favorites_store),
        }
    }

    pub fn catalog(&self) -> &CatalogOrchestrator {
        &self.catalog
    }

    pub fn favorites(&self) -> &FavoritesEngine {
        &self.favorites
    }

    pub fn details(&self) -> &DetailViewService {
        &self.details
    }

    pub fn catalog_snapshot(&self) -> CatalogSnapshot {
        self.catalog.store().snapshot()
    }

    pub fn favorites_snapshot(&self) -> FavoritesState {
        self.favorites.store().snapshot()
    }

    /// Runs one shell intent to completion
    pub async fn dispatch(&self, intent: ShellIntent) -> SyncResult<IntentOutcome> {
        debug!("Dispatching intent {:?}", intent);
        let outcome = match intent {
            ShellIntent::LoadPage(page) => IntentOutcome::Catalog(self.catalog.load_page(page).await?),
            ShellIntent::NextPage => IntentOutcome::Catalog(self.catalog.next_page().await?),
            ShellIntent::PreviousPage => IntentOutcome::Catalog(self.catalog.previous_page().await?),
            ShellIntent::LoadFavoriteIds => IntentOutcome::FavoriteIds(self.favorites.load_favorite_ids().await?),
            ShellIntent::SyncFavorites => IntentOutcome::Favorites(self.favorites.sync().await?),
            ShellIntent::AddFavorite(id) => {
                let record = self.details.find_record(id)?;
                IntentOutcome::Added(self.favorites.add_favorite(record).await?)
            }
            ShellIntent::RemoveFavorite(id) => IntentOutcome::Removed(self.favorites.remove_favorite(id).await?),
            ShellIntent::ToggleFavorite(id) => {
                let record = self.details.find_record(id)?;
                IntentOutcome::Toggled(self.favorites.toggle_favorite(record).await?)
            }
            ShellIntent::ViewDetail(id) => IntentOutcome::Detail(Box::new(self.details.view_detail(id).await?)),
        };
        Ok(outcome)
    }
}
