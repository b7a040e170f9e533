//! Detail view: one record plus the damage relations of its primary type.
//!
//! Nothing here is stored; a [`DetailView`] lives as long as the caller keeps it.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use ts_rs::TS;

use crate::domain::damage_relations::DamageRelations;
use crate::domain::errors::{SyncError, SyncResult};
use crate::domain::item::ItemRecord;
use crate::domain::services::CatalogRemote;
use crate::sync::state::{CatalogStore, FavoritesStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DetailView {
    pub record: ItemRecord,
    pub is_favorite: bool,
    pub damage_relations: DamageRelations,
    /// Set when the type lookup failed; the record is still shown
    pub relations_error: Option<SyncError>,
}

pub struct DetailViewService {
    remote: Arc<dyn CatalogRemote>,
    catalog: Arc<CatalogStore>,
    favorites: Arc<FavoritesStore>,
}

impl DetailViewService {
    pub fn new(remote: Arc<dyn CatalogRemote>, catalog: Arc<CatalogStore>, favorites: Arc<FavoritesStore>) -> Self {
        Self {
            remote,
            catalog,
            favorites,
        }
    }

    /// Record for `id` from the favorites collection (when it is a favorite) or the catalog page
    pub fn find_record(&self, id: u32) -> SyncResult<ItemRecord> {
        let favorites = self.favorites.snapshot();
        let from_favorites = favorites.detail(id).filter(|_| favorites.contains(id)).cloned();

        from_favorites
            .or_else(|| self.catalog.snapshot().find(id).cloned())
            .ok_or_else(|| SyncError::NotFound(format!("pokemon {} is not loaded", id)))
    }

    pub async fn view_detail(&self, id: u32) -> SyncResult<DetailView> {
        let record = self.find_record(id)?;
        let is_favorite = self.favorites.is_favorite(id);

        let (damage_relations, relations_error) = match record.primary_type() {
            None => (DamageRelations::default(), None),
            Some(type_name) => match self.remote.fetch_damage_relations(type_name).await {
                Ok(relations) => {
                    debug!("Loaded damage relations of {} for #{}", type_name, id);
                    (relations, None)
                }
                Err(error) => {
                    warn!("Failed to load type details of {}: {}", type_name, error);
                    (DamageRelations::default(), Some(error))
                }
            },
        };

        Ok(DetailView {
            record,
            is_favorite,
            damage_relations,
            relations_error,
        })
    }
}
