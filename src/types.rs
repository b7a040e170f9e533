//! Shell-facing intent vocabulary
//!
//! The presentation shell never mutates state directly: it sends a [`ShellIntent`]
//! and renders the [`IntentOutcome`] (or the store snapshots). Both derive ts-rs
//! bindings so the shell consumes them without hand-written mirrors.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::domain::item::ItemRecord;
use crate::sync::detail_view::DetailView;
use crate::sync::favorites_engine::ToggleOutcome;
use crate::sync::state::{CatalogSnapshot, FavoritesState};

/// Intent issued by the presentation shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
#[ts(export)]
pub enum ShellIntent {
    LoadPage(u32),
    NextPage,
    PreviousPage,
    LoadFavoriteIds,
    SyncFavorites,
    /// Add the loaded record with this id
    AddFavorite(u32),
    RemoveFavorite(u32),
    ToggleFavorite(u32),
    ViewDetail(u32),
}

/// What an intent produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
#[ts(export)]
pub enum IntentOutcome {
    Catalog(CatalogSnapshot),
    FavoriteIds(Vec<u32>),
    Favorites(FavoritesState),
    Added(ItemRecord),
    Removed(Vec<u32>),
    Toggled(ToggleOutcome),
    Detail(Box<DetailView>),
}

impl ShellIntent {
    /// Parses the runner's command-line form (`page 3`, `add 25`, `favorites`, ...)
    pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Option<Self> {
        let word = args.first()?.as_ref();
        let number = || args.get(1).and_then(|arg| arg.as_ref().parse::<u32>().ok());

        match word {
            "page" => number().map(Self::LoadPage),
            "next" => Some(Self::NextPage),
            "prev" | "previous" => Some(Self::PreviousPage),
            "ids" => Some(Self::LoadFavoriteIds),
            "favorites" | "sync" => Some(Self::SyncFavorites),
            "add" => number().map(Self::AddFavorite),
            "remove" => number().map(Self::RemoveFavorite),
            "toggle" => number().map(Self::ToggleFavorite),
            "detail" => number().map(Self::ViewDetail),
            _ => None,
        }
    }

    /// Intents that act on a record must find it in a loaded page first
    #[must_use]
    pub const fn needs_catalog(&self) -> bool {
        matches!(
            self,
            Self::AddFavorite(_) | Self::ToggleFavorite(_) | Self::ViewDetail(_)
        )
    }
}
