//! # Favorites Synchronization Engine
//!
//! Owns the confirmed favorites set. Nothing is applied before the favorites
//! store confirms it.
//!
//! Ordering between concurrent mutations is decided by round-trip completion.
//! Every add/remove/id-load takes a sequence number when issued; the ledger keeps,
//! per id, the latest committed mutation. An authoritative id set (remove response
//! or id load issued at `s`) gets the committed mutations newer than `s` laid over
//! it, and an add confirmation is dropped when a newer mutation of the same id has
//! already been committed.

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::domain::errors::{SyncError, SyncResult};
use crate::domain::item::ItemRecord;
use crate::domain::normalizer::normalize;
use crate::domain::services::FavoritesRemote;
use crate::sync::state::{FavoritesState, FavoritesStore};

/// Result of [`FavoritesEngine::toggle_favorite`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
#[ts(export)]
pub enum ToggleOutcome {
    Added(ItemRecord),
    /// Remaining favorite ids reported by the store
    Removed(Vec<u32>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Mutation {
    seq: u64,
    present: bool,
}

#[derive(Debug, Default)]
struct Ledger {
    next_seq: u64,
    in_flight: BTreeSet<u64>,
    committed: HashMap<u32, Mutation>,
}

impl Ledger {
    fn issue(&mut self) -> u64 {
        self.next_seq += 1;
        self.in_flight.insert(self.next_seq);
        self.next_seq
    }

    fn retire(&mut self, seq: u64) {
        self.in_flight.remove(&seq);
        // an entry is only needed while an older operation can still commit
        match self.in_flight.first() {
            Some(&oldest) => self.committed.retain(|_, m| m.seq > oldest),
            None => self.committed.clear(),
        }
    }

    fn has_newer(&self, id: u32, seq: u64) -> bool {
        self.committed.get(&id).is_some_and(|m| m.seq > seq)
    }

    fn record(&mut self, id: u32, mutation: Mutation) {
        if !self.has_newer(id, mutation.seq) {
            self.committed.insert(id, mutation);
        }
    }

    /// Authoritative set as of `seq`, with newer committed mutations applied in commit order
    fn reconcile(&self, authoritative: Vec<u32>, seq: u64) -> Vec<u32> {
        let mut ids: Vec<u32> = Vec::with_capacity(authoritative.len());
        for id in authoritative {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        let mut newer: Vec<(u32, Mutation)> = self
            .committed
            .iter()
            .filter(|(_, m)| m.seq > seq)
            .map(|(id, m)| (*id, *m))
            .collect();
        newer.sort_by_key(|(_, m)| m.seq);

        for (id, mutation) in newer {
            if mutation.present {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            } else {
                ids.retain(|fav| *fav != id);
            }
        }
        ids
    }
}

pub struct FavoritesEngine {
    remote: Arc<dyn FavoritesRemote>,
    store: Arc<FavoritesStore>,
    ledger: Mutex<Ledger>,
    detail_limiter: Arc<Semaphore>,
}

impl FavoritesEngine {
    pub fn new(remote: Arc<dyn FavoritesRemote>, store: Arc<FavoritesStore>, detail_max_concurrent: usize) -> Self {
        Self {
            remote,
            store,
            ledger: Mutex::new(Ledger::default()),
            detail_limiter: Arc::new(Semaphore::new(detail_max_concurrent.max(1))),
        }
    }

    pub fn store(&self) -> &Arc<FavoritesStore> {
        &self.store
    }

    pub fn is_favorite(&self, id: u32) -> bool {
        self.store.is_favorite(id)
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) -> u64 {
        let mut ledger = self.ledger();
        let seq = ledger.issue();
        self.store.begin_operation();
        seq
    }

    fn fail(&self, seq: u64, error: &SyncError) {
        let mut ledger = self.ledger();
        ledger.retire(seq);
        let error = error.clone();
        self.store.finish_operation(|state| state.last_error = Some(error));
    }

    /// Replaces the id set with the store's, keeping newer local confirmations on top,
    /// then loads the detail records the new set is missing
    pub async fn load_favorite_ids(&self) -> SyncResult<Vec<u32>> {
        let ids = self.refresh_ids().await?;
        self.fill_missing_details().await?;
        Ok(ids)
    }

    async fn refresh_ids(&self) -> SyncResult<Vec<u32>> {
        let seq = self.begin();
        match self.remote.fetch_favorite_ids().await {
            Ok(remote_ids) => {
                let mut ledger = self.ledger();
                let ids = ledger.reconcile(remote_ids, seq);
                ledger.retire(seq);
                let committed = ids.clone();
                self.store.finish_operation(|state| {
                    state.favorite_details.retain(|item| ids.contains(&item.id));
                    state.favorite_ids = ids;
                    state.last_error = None;
                });
                info!("⭐ Loaded {} favorite ids", committed.len());
                Ok(committed)
            }
            Err(error) => {
                warn!("❌ Loading favorite ids failed: {}", error);
                self.fail(seq, &error);
                Err(error)
            }
        }
    }

    /// Fetches and normalizes the detail record of every id, all-or-nothing.
    /// A load overtaken by a newer one is discarded.
    pub async fn load_favorite_details(&self, ids: &[u32]) -> SyncResult<Vec<ItemRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let tokens = self.store.detail_tokens();
        let token = tokens.issue();
        self.store.begin_operation();
        debug!("Loading {} favorite details (token {})", ids.len(), token);

        match try_join_all(ids.iter().map(|id| self.fetch_detail(*id))).await {
            Ok(records) => {
                let mut committed = false;
                self.store.finish_operation(|state| {
                    if !tokens.is_latest(token) {
                        return;
                    }
                    let rebuilt: Vec<ItemRecord> = state
                        .favorite_ids
                        .iter()
                        .filter_map(|id| {
                            records
                                .iter()
                                .find(|r| r.id == *id)
                                .or_else(|| state.detail(*id))
                                .cloned()
                        })
                        .collect();
                    state.favorite_details = rebuilt;
                    state.last_error = None;
                    committed = true;
                });

                if committed {
                    info!("⭐ Committed {} favorite details", records.len());
                    Ok(records)
                } else {
                    warn!("Discarded stale favorite details (token {})", token);
                    Err(SyncError::Superseded { token })
                }
            }
            Err(error) => {
                let recorded = error.clone();
                self.store.finish_operation(|state| {
                    if tokens.is_latest(token) {
                        state.last_error = Some(recorded);
                    }
                });
                warn!("❌ Loading favorite details failed: {}", error);
                Err(error)
            }
        }
    }

    /// Loads records for favorite ids that have none; a superseded load counts as done
    async fn fill_missing_details(&self) -> SyncResult<()> {
        let missing = self.store.snapshot().missing_details();
        if missing.is_empty() {
            return Ok(());
        }
        debug!("{} favorites have no detail record yet", missing.len());
        match self.load_favorite_details(&missing).await {
            Ok(_) | Err(SyncError::Superseded { .. }) => Ok(()),
            Err(error) => Err(error),
        }
    }

    async fn fetch_detail(&self, id: u32) -> SyncResult<ItemRecord> {
        let _permit = self
            .detail_limiter
            .acquire()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        let record = normalize(self.remote.fetch_favorite_item(id).await?)?;
        if record.id != id {
            return Err(SyncError::Validation(format!(
                "requested favorite {} but received record {}",
                id, record.id
            )));
        }
        Ok(record)
    }

    /// Inserts `item` once the store has confirmed it; adding an existing favorite is a no-op
    pub async fn add_favorite(&self, item: ItemRecord) -> SyncResult<ItemRecord> {
        let seq = self.begin();
        match self.remote.add_favorite(item.id).await {
            Ok(()) => {
                let mut ledger = self.ledger();
                let overtaken = ledger.has_newer(item.id, seq);
                if !overtaken {
                    ledger.record(item.id, Mutation { seq, present: true });
                }
                ledger.retire(seq);

                let record = item.clone();
                self.store.finish_operation(|state| {
                    state.last_error = None;
                    if overtaken {
                        return;
                    }
                    if !state.favorite_ids.contains(&record.id) {
                        state.favorite_ids.push(record.id);
                    }
                    if state.detail(record.id).is_none() {
                        state.favorite_details.push(record);
                    }
                });

                if overtaken {
                    warn!("Add of favorite {} was overtaken by a newer mutation", item.id);
                    Err(SyncError::Superseded { token: seq })
                } else {
                    info!("⭐ Added favorite {} ({})", item.id, item.name);
                    Ok(item)
                }
            }
            Err(error) => {
                warn!("❌ Adding favorite {} failed: {}", item.id, error);
                self.fail(seq, &error);
                Err(error)
            }
        }
    }

    /// Removes `id` and adopts the remaining set reported by the store.
    /// Ids the store reports that have no record yet get their details loaded.
    pub async fn remove_favorite(&self, id: u32) -> SyncResult<Vec<u32>> {
        let seq = self.begin();
        match self.remote.remove_favorite(id).await {
            Ok(remaining) => {
                let committed = {
                    let mut ledger = self.ledger();
                    let ids = ledger.reconcile(remaining, seq);
                    ledger.record(id, Mutation { seq, present: false });
                    ledger.retire(seq);

                    let committed = ids.clone();
                    self.store.finish_operation(|state| {
                        state.favorite_details.retain(|item| ids.contains(&item.id));
                        state.favorite_ids = ids;
                        state.last_error = None;
                    });
                    info!("⭐ Removed favorite {}; {} remain", id, committed.len());
                    committed
                };
                self.fill_missing_details().await?;
                Ok(committed)
            }
            Err(error) => {
                warn!("❌ Removing favorite {} failed: {}", id, error);
                self.fail(seq, &error);
                Err(error)
            }
        }
    }

    /// Reloads the id set and, when it changed or records are missing, the details
    pub async fn sync(&self) -> SyncResult<FavoritesState> {
        let mut before = self.store.snapshot().favorite_ids;
        let ids = self.refresh_ids().await?;

        let mut after = ids.clone();
        before.sort_unstable();
        after.sort_unstable();
        let missing = !self.store.snapshot().missing_details().is_empty();

        if !ids.is_empty() && (before != after || missing) {
            match self.load_favorite_details(&ids).await {
                Ok(_) | Err(SyncError::Superseded { .. }) => {}
                Err(error) => return Err(error),
            }
        }
        Ok(self.store.snapshot())
    }

    /// Removes `item` when it is a favorite, adds it otherwise
    pub async fn toggle_favorite(&self, item: ItemRecord) -> SyncResult<ToggleOutcome> {
        if self.is_favorite(item.id) {
            self.remove_favorite(item.id).await.map(ToggleOutcome::Removed)
        } else {
            self.add_favorite(item).await.map(ToggleOutcome::Added)
        }
    }
}
