//! In-memory catalog + favorites backend.
//!
//! Serves the binary's `--offline` mode and doubles as the test remote: every
//! call is recorded, failures can be injected per call, and a gate can hold a
//! call's response back until the test releases it so completion order is under
//! the caller's control.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::damage_relations::DamageRelations;
use crate::domain::errors::{SyncError, SyncResult};
use crate::domain::listing::{ItemRef, PageListing};
use crate::domain::normalizer::normalize_value;
use crate::domain::payload::RawItem;
use crate::domain::services::{CatalogRemote, FavoritesRemote};

const DETAIL_URL_PREFIX: &str = "memory://catalog/pokemon/";

/// Oldest calls are dropped past this many, so a long `--offline` session stays bounded
pub const CALL_LOG_LIMIT: usize = 4096;

const STARTER_NAMES: [&str; 12] = [
    "bulbasaur",
    "ivysaur",
    "venusaur",
    "charmander",
    "charmeleon",
    "charizard",
    "squirtle",
    "wartortle",
    "blastoise",
    "caterpie",
    "metapod",
    "butterfree",
];

const TYPE_CYCLE: [&str; 4] = ["grass", "fire", "water", "electric"];

/// One remote call, used as the key for the call log, failures and gates
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RemoteCall {
    Listing { limit: u32, offset: u32 },
    Item(u32),
    DamageRelations(String),
    FavoriteIds,
    FavoriteItem(u32),
    AddFavorite(u32),
    RemoveFavorite(u32),
}

/// Holds a call's response until released. Stays open once released.
#[derive(Debug, Clone)]
pub struct Gate {
    permits: Arc<Semaphore>,
}

impl Gate {
    fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(0)),
        }
    }

    pub fn release(&self) {
        self.permits.add_permits(1);
    }

    async fn pass(&self) -> SyncResult<()> {
        self.permits
            .acquire()
            .await
            .map(drop)
            .map_err(|_| SyncError::Network("gate closed".to_string()))
    }
}

#[derive(Default)]
struct Backend {
    /// id -> full remote detail payload, kept sorted by id for listing
    items: Vec<(u32, Value)>,
    type_relations: HashMap<String, DamageRelations>,
    favorite_ids: Vec<u32>,
    calls: VecDeque<RemoteCall>,
    failures: HashMap<RemoteCall, SyncError>,
    gates: HashMap<RemoteCall, Gate>,
}

/// Both remote contracts backed by process memory
#[derive(Clone, Default)]
pub struct InMemoryRemote {
    backend: Arc<Mutex<Backend>>,
}

fn lock(backend: &Mutex<Backend>) -> MutexGuard<'_, Backend> {
    backend.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Detail url handed out in listings for `id`
pub fn detail_url(id: u32) -> String {
    format!("{}{}/", DETAIL_URL_PREFIX, id)
}

/// Full remote-shaped detail payload for a synthetic item
pub fn synthetic_item(id: u32) -> Value {
    let name = STARTER_NAMES
        .get(id.wrapping_sub(1) as usize)
        .map_or_else(|| format!("pokemon-{}", id), |n| (*n).to_string());
    let primary = TYPE_CYCLE[(id as usize) % TYPE_CYCLE.len()];
    let base = 20 + id % 80;

    json!({
        "id": id,
        "name": name,
        "height": 3 + id % 20,
        "weight": 40 + id * 7 % 900,
        "sprites": {
            "front_default": format!("memory://sprites/{}.png", id),
            "other": {"dream_world": {"front_default": format!("memory://sprites/dream/{}.svg", id)}}
        },
        "types": [{"slot": 1, "type": {"name": primary, "url": format!("memory://type/{}", primary)}}],
        "stats": [
            {"base_stat": base + 25, "effort": 0, "stat": {"name": "hp"}},
            {"base_stat": base + 30, "effort": 0, "stat": {"name": "attack"}},
            {"base_stat": base + 20, "effort": 0, "stat": {"name": "defense"}},
            {"base_stat": base + 35, "effort": 0, "stat": {"name": "special-attack"}},
            {"base_stat": base + 15, "effort": 0, "stat": {"name": "special-defense"}},
            {"base_stat": base + 10, "effort": 0, "stat": {"name": "speed"}}
        ],
        "abilities": [
            {"ability": {"name": "overgrow", "url": "memory://ability/65"}, "is_hidden": false, "slot": 1}
        ]
    })
}

fn default_type_relations() -> HashMap<String, DamageRelations> {
    let rel = |to2: &[&str], from2: &[&str], to_half: &[&str], from_half: &[&str]| DamageRelations {
        double_damage_to: to2.iter().map(|s| (*s).to_string()).collect(),
        double_damage_from: from2.iter().map(|s| (*s).to_string()).collect(),
        half_damage_to: to_half.iter().map(|s| (*s).to_string()).collect(),
        half_damage_from: from_half.iter().map(|s| (*s).to_string()).collect(),
        no_damage_to: Vec::new(),
        no_damage_from: Vec::new(),
    };

    let mut relations = HashMap::new();
    relations.insert(
        "grass".to_string(),
        rel(&["water", "ground"], &["fire", "flying"], &["fire", "grass"], &["water", "electric"]),
    );
    relations.insert(
        "fire".to_string(),
        rel(&["grass", "ice"], &["water", "rock"], &["water", "fire"], &["grass", "fire"]),
    );
    relations.insert(
        "water".to_string(),
        rel(&["fire", "rock"], &["grass", "electric"], &["water", "grass"], &["fire", "water"]),
    );
    let mut electric = rel(&["water", "flying"], &["ground"], &["electric", "grass"], &["electric", "flying"]);
    electric.no_damage_to.push("ground".to_string());
    relations.insert("electric".to_string(), electric);
    relations
}

impl InMemoryRemote {
    /// Empty catalog, empty favorites
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of `count` synthetic items (ids `1..=count`) plus type relations
    pub fn with_generated_catalog(count: u32) -> Self {
        let remote = Self::new();
        {
            let mut backend = lock(&remote.backend);
            backend.items = (1..=count).map(|id| (id, synthetic_item(id))).collect();
            backend.type_relations = default_type_relations();
        }
        remote
    }

    /// Insert or replace one detail payload (remote or cached shape)
    pub fn insert_item(&self, id: u32, payload: Value) {
        let mut backend = lock(&self.backend);
        match backend.items.binary_search_by_key(&id, |(item_id, _)| *item_id) {
            Ok(pos) => backend.items[pos].1 = payload,
            Err(pos) => backend.items.insert(pos, (id, payload)),
        }
    }

    pub fn set_type_relations(&self, type_name: &str, relations: DamageRelations) {
        lock(&self.backend)
            .type_relations
            .insert(type_name.to_string(), relations);
    }

    /// Replace the stored favorites set
    pub fn set_favorite_ids(&self, ids: Vec<u32>) {
        lock(&self.backend).favorite_ids = ids;
    }

    /// Current server-side favorites set
    pub fn favorite_ids(&self) -> Vec<u32> {
        lock(&self.backend).favorite_ids.clone()
    }

    pub fn item_count(&self) -> usize {
        lock(&self.backend).items.len()
    }

    /// Make every subsequent `call` fail with `error` until cleared
    pub fn fail(&self, call: RemoteCall, error: SyncError) {
        lock(&self.backend).failures.insert(call, error);
    }

    pub fn clear_failure(&self, call: &RemoteCall) {
        lock(&self.backend).failures.remove(call);
    }

    /// Hold the response of `call` until the returned gate is released.
    /// Mutations are applied on arrival; only the response is delayed.
    pub fn gate(&self, call: RemoteCall) -> Gate {
        let gate = Gate::new();
        lock(&self.backend).gates.insert(call, gate.clone());
        gate
    }

    /// The last [`CALL_LOG_LIMIT`] calls received, in arrival order
    pub fn calls(&self) -> Vec<RemoteCall> {
        lock(&self.backend).calls.iter().cloned().collect()
    }

    pub fn call_count(&self, call: &RemoteCall) -> usize {
        lock(&self.backend).calls.iter().filter(|c| *c == call).count()
    }

    /// Records the call, applies `effect` unless a failure is injected, then
    /// waits on the call's gate before answering.
    async fn respond<T>(
        &self,
        call: RemoteCall,
        effect: impl FnOnce(&mut Backend) -> SyncResult<T> + Send,
    ) -> SyncResult<T> {
        let (result, gate) = {
            let mut backend = lock(&self.backend);
            if backend.calls.len() == CALL_LOG_LIMIT {
                backend.calls.pop_front();
            }
            backend.calls.push_back(call.clone());
            let gate = backend.gates.get(&call).cloned();
            let result = match backend.failures.get(&call) {
                Some(error) => Err(error.clone()),
                None => effect(&mut backend),
            };
            (result, gate)
        };

        if let Some(gate) = gate {
            debug!("Holding response of {:?}", call);
            gate.pass().await?;
        }
        result
    }
}

fn id_from_detail_url(detail_url: &str) -> SyncResult<u32> {
    let item_ref = ItemRef {
        name: String::new(),
        url: detail_url.to_string(),
    };
    item_ref
        .id()
        .ok_or_else(|| SyncError::Validation(format!("unrecognized detail url: {}", detail_url)))
}

fn find_item(backend: &Backend, id: u32) -> SyncResult<Value> {
    backend
        .items
        .binary_search_by_key(&id, |(item_id, _)| *item_id)
        .map(|pos| backend.items[pos].1.clone())
        .map_err(|_| SyncError::NotFound(format!("pokemon {}", id)))
}

#[async_trait]
impl CatalogRemote for InMemoryRemote {
    async fn fetch_listing(&self, limit: u32, offset: u32) -> SyncResult<PageListing> {
        self.respond(RemoteCall::Listing { limit, offset }, |backend| {
            let results = backend
                .items
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .map(|(id, payload)| ItemRef {
                    name: payload["name"].as_str().unwrap_or_default().to_string(),
                    url: detail_url(*id),
                })
                .collect();
            Ok(PageListing {
                count: u32::try_from(backend.items.len()).unwrap_or(u32::MAX),
                results,
            })
        })
        .await
    }

    async fn fetch_item(&self, detail_url: &str) -> SyncResult<RawItem> {
        let id = id_from_detail_url(detail_url)?;
        self.respond(RemoteCall::Item(id), |backend| RawItem::from_value(find_item(backend, id)?))
            .await
    }

    async fn fetch_damage_relations(&self, type_name: &str) -> SyncResult<DamageRelations> {
        let name = type_name.to_string();
        self.respond(RemoteCall::DamageRelations(name.clone()), move |backend| {
            backend
                .type_relations
                .get(&name)
                .cloned()
                .ok_or_else(|| SyncError::NotFound(format!("type {}", name)))
        })
        .await
    }
}

#[async_trait]
impl FavoritesRemote for InMemoryRemote {
    async fn fetch_favorite_ids(&self) -> SyncResult<Vec<u32>> {
        self.respond(RemoteCall::FavoriteIds, |backend| Ok(backend.favorite_ids.clone()))
            .await
    }

    /// Served in the simplified cached shape, as the favorites store does
    async fn fetch_favorite_item(&self, id: u32) -> SyncResult<RawItem> {
        self.respond(RemoteCall::FavoriteItem(id), |backend| {
            let record = normalize_value(find_item(backend, id)?)?;
            RawItem::from_value(json!({
                "id": record.id,
                "name": record.name,
                "sprites": record.sprite_url,
                "types": record.types,
                "height": record.height,
                "weight": record.weight,
                "abilities": record.abilities,
                "stats": record.stats,
            }))
        })
        .await
    }

    async fn add_favorite(&self, id: u32) -> SyncResult<()> {
        self.respond(RemoteCall::AddFavorite(id), |backend| {
            if !backend.favorite_ids.contains(&id) {
                backend.favorite_ids.push(id);
            }
            Ok(())
        })
        .await
    }

    async fn remove_favorite(&self, id: u32) -> SyncResult<Vec<u32>> {
        self.respond(RemoteCall::RemoveFavorite(id), |backend| {
            backend.favorite_ids.retain(|fav| *fav != id);
            Ok(backend.favorite_ids.clone())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listing_pages_through_generated_catalog() {
        let remote = InMemoryRemote::with_generated_catalog(120);
        let page = remote.fetch_listing(50, 100).await.unwrap();
        assert_eq!(page.count, 120);
        assert_eq!(page.results.len(), 20);
        assert_eq!(page.results[0].id(), Some(101));

        let past_end = remote.fetch_listing(50, 150).await.unwrap();
        assert!(past_end.results.is_empty());
    }

    #[tokio::test]
    async fn call_log_keeps_only_the_newest_calls() {
        let remote = InMemoryRemote::with_generated_catalog(1);
        remote.fetch_item(&detail_url(1)).await.unwrap();
        for _ in 0..CALL_LOG_LIMIT {
            remote.fetch_favorite_ids().await.unwrap();
        }

        let calls = remote.calls();
        assert_eq!(calls.len(), CALL_LOG_LIMIT);
        assert_eq!(remote.call_count(&RemoteCall::Item(1)), 0);
        assert_eq!(calls.last(), Some(&RemoteCall::FavoriteIds));
    }

    #[tokio::test]
    async fn catalog_and_favorites_serve_different_shapes() {
        let remote = InMemoryRemote::with_generated_catalog(5);
        let remote_shape = remote.fetch_item(&detail_url(4)).await.unwrap();
        let cached_shape = remote.fetch_favorite_item(4).await.unwrap();
        assert!(matches!(remote_shape, RawItem::Remote(_)));
        assert!(matches!(cached_shape, RawItem::Cached(_)));
        assert!(matches!(
            remote.fetch_favorite_item(99).await,
            Err(SyncError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn injected_failure_skips_the_mutation() {
        let remote = InMemoryRemote::with_generated_catalog(5);
        remote.fail(RemoteCall::AddFavorite(3), SyncError::Network("boom".into()));
        assert!(remote.add_favorite(3).await.is_err());
        assert!(remote.favorite_ids().is_empty());

        remote.clear_failure(&RemoteCall::AddFavorite(3));
        remote.add_favorite(3).await.unwrap();
        remote.add_favorite(3).await.unwrap();
        assert_eq!(remote.favorite_ids(), vec![3]);
        assert_eq!(remote.call_count(&RemoteCall::AddFavorite(3)), 3);
    }

    #[tokio::test]
    async fn gate_holds_response_but_not_mutation() {
        let remote = InMemoryRemote::with_generated_catalog(5);
        let gate = remote.gate(RemoteCall::AddFavorite(2));

        let pending = tokio::spawn({
            let remote = remote.clone();
            async move { remote.add_favorite(2).await }
        });
        tokio::task::yield_now().await;
        while remote.call_count(&RemoteCall::AddFavorite(2)) == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(remote.favorite_ids(), vec![2]);
        assert!(!pending.is_finished());

        gate.release();
        pending.await.unwrap().unwrap();
    }
}
