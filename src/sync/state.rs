//! Owned state containers for the two synchronized collections.
//!
//! Each store keeps its state behind a `tokio::sync::watch` channel. Readers take
//! an owned [`snapshot`](CatalogStore::snapshot) or [`subscribe`](CatalogStore::subscribe)
//! to changes; writes are crate-private and every write is one atomic transition
//! under the channel's lock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::watch;
use ts_rs::TS;

use crate::domain::errors::SyncError;
use crate::domain::item::ItemRecord;
use crate::sync::tokens::RequestTokens;

/// The currently displayed catalog page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CatalogSnapshot {
    /// Items of exactly one page request
    pub items: Vec<ItemRecord>,
    /// Authoritative total from the list endpoint
    pub total_count: u32,
    pub is_loading: bool,
    /// Page the items belong to; `None` until the first commit
    pub page: Option<u32>,
    pub last_error: Option<SyncError>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl CatalogSnapshot {
    /// Total count once the list endpoint has answered at least once
    #[must_use]
    pub fn known_total(&self) -> Option<u32> {
        self.page.map(|_| self.total_count)
    }

    #[must_use]
    pub fn find(&self, id: u32) -> Option<&ItemRecord> {
        self.items.iter().find(|item| item.id == id)
    }
}

/// Confirmed favorites set and its detail records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FavoritesState {
    /// Duplicate-free, in insertion order (also the display order)
    pub favorite_ids: Vec<u32>,
    /// Every record's id is in `favorite_ids`
    pub favorite_details: Vec<ItemRecord>,
    pub is_loading: bool,
    pub last_error: Option<SyncError>,
}

impl FavoritesState {
    #[must_use]
    pub fn contains(&self, id: u32) -> bool {
        self.favorite_ids.contains(&id)
    }

    #[must_use]
    pub fn detail(&self, id: u32) -> Option<&ItemRecord> {
        self.favorite_details.iter().find(|item| item.id == id)
    }

    /// Ids that do not have a detail record yet
    #[must_use]
    pub fn missing_details(&self) -> Vec<u32> {
        self.favorite_ids
            .iter()
            .copied()
            .filter(|id| self.detail(*id).is_none())
            .collect()
    }
}

/// Single-writer container of the [`CatalogSnapshot`]
#[derive(Debug)]
pub struct CatalogStore {
    tx: watch::Sender<CatalogSnapshot>,
    tokens: RequestTokens,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(CatalogSnapshot::default());
        Self {
            tx,
            tokens: RequestTokens::new(),
        }
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CatalogSnapshot> {
        self.tx.subscribe()
    }

    pub fn latest_token(&self) -> u64 {
        self.tokens.latest()
    }

    /// Issues a request token and raises the loading flag in one transition
    pub(crate) fn begin_request(&self) -> u64 {
        let mut token = 0;
        self.tx.send_modify(|snapshot| {
            token = self.tokens.issue();
            snapshot.is_loading = true;
        });
        token
    }

    /// Replaces the snapshot wholesale if `token` is still the latest request
    pub(crate) fn commit_page(&self, token: u64, page: u32, total_count: u32, items: Vec<ItemRecord>) -> bool {
        self.tx.send_if_modified(|snapshot| {
            if !self.tokens.is_latest(token) {
                return false;
            }
            *snapshot = CatalogSnapshot {
                items,
                total_count,
                is_loading: false,
                page: Some(page),
                last_error: None,
                fetched_at: Some(Utc::now()),
            };
            true
        })
    }

    /// Records a failure of the latest request; committed data is left untouched
    pub(crate) fn fail_request(&self, token: u64, error: SyncError) -> bool {
        self.tx.send_if_modified(|snapshot| {
            if !self.tokens.is_latest(token) {
                return false;
            }
            snapshot.is_loading = false;
            snapshot.last_error = Some(error);
            true
        })
    }
}

/// Single-writer container of the [`FavoritesState`]
#[derive(Debug)]
pub struct FavoritesStore {
    tx: watch::Sender<FavoritesState>,
    /// Operations between `begin_operation` and `finish_operation`
    pending: AtomicUsize,
    detail_tokens: RequestTokens,
}

impl Default for FavoritesStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FavoritesStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(FavoritesState::default());
        Self {
            tx,
            pending: AtomicUsize::new(0),
            detail_tokens: RequestTokens::new(),
        }
    }

    pub fn snapshot(&self) -> FavoritesState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FavoritesState> {
        self.tx.subscribe()
    }

    pub fn is_favorite(&self, id: u32) -> bool {
        self.tx.borrow().contains(id)
    }

    pub(crate) fn detail_tokens(&self) -> &RequestTokens {
        &self.detail_tokens
    }

    /// Marks one more operation pending
    pub(crate) fn begin_operation(&self) {
        self.tx.send_modify(|state| {
            self.pending.fetch_add(1, Ordering::SeqCst);
            state.is_loading = true;
        });
    }

    /// Applies `commit` and retires one pending operation in the same transition.
    /// Loading stays raised while other operations are still pending.
    pub(crate) fn finish_operation(&self, commit: impl FnOnce(&mut FavoritesState)) {
        self.tx.send_modify(|state| {
            commit(state);
            let before = self
                .pending
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)))
                .unwrap_or(0);
            state.is_loading = before > 1;
        });
    }
}
