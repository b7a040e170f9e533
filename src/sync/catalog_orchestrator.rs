//! # Catalog Fetch Orchestrator
//!
//! Loads one catalog page: list request, concurrent detail fan-out bounded by a
//! semaphore, normalization, then a single all-or-nothing commit guarded by the
//! page's request token.

use futures::future::try_join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::domain::errors::{SyncError, SyncResult};
use crate::domain::item::ItemRecord;
use crate::domain::listing::ItemRef;
use crate::domain::normalizer::normalize;
use crate::domain::pagination::{PageRequest, Paginator, derive_page};
use crate::domain::services::CatalogRemote;
use crate::sync::state::{CatalogSnapshot, CatalogStore};

pub struct CatalogOrchestrator {
    remote: Arc<dyn CatalogRemote>,
    store: Arc<CatalogStore>,
    paginator: Paginator,
    detail_limiter: Arc<Semaphore>,
}

impl CatalogOrchestrator {
    pub fn new(
        remote: Arc<dyn CatalogRemote>,
        store: Arc<CatalogStore>,
        paginator: Paginator,
        detail_max_concurrent: usize,
    ) -> Self {
        Self {
            remote,
            store,
            paginator,
            detail_limiter: Arc::new(Semaphore::new(detail_max_concurrent.max(1))),
        }
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    /// Loads `page` and commits it as the new snapshot.
    ///
    /// Out-of-range pages are rejected before any fetch and leave the store untouched.
    /// Before the first commit the total is unknown, so the bound is checked against
    /// the listing's count instead and the page fails without being committed.
    /// A result overtaken by a newer `load_page` is discarded and reported as
    /// [`SyncError::Superseded`].
    pub async fn load_page(&self, page: u32) -> SyncResult<CatalogSnapshot> {
        let known_total = self.store.snapshot().known_total();
        let request = self.paginator.derive(page, known_total).inspect_err(|e| {
            warn!("Rejected catalog navigation: {}", e);
        })?;
        self.load_request(request).await
    }

    /// Loads the page after the committed one (page 1 when nothing is committed yet)
    pub async fn next_page(&self) -> SyncResult<CatalogSnapshot> {
        let snapshot = self.store.snapshot();
        let request = match (snapshot.page, snapshot.known_total()) {
            (Some(current), Some(total)) => self.paginator.next(current, total)?,
            _ => self.paginator.derive(1, None)?,
        };
        self.load_request(request).await
    }

    /// Loads the page before the committed one
    pub async fn previous_page(&self) -> SyncResult<CatalogSnapshot> {
        let snapshot = self.store.snapshot();
        let request = match (snapshot.page, snapshot.known_total()) {
            (Some(current), Some(total)) => self.paginator.previous(current, total)?,
            _ => {
                return Err(SyncError::OutOfRange {
                    requested: 0,
                    max_page: 1,
                });
            }
        };
        self.load_request(request).await
    }

    async fn load_request(&self, request: PageRequest) -> SyncResult<CatalogSnapshot> {
        let token = self.store.begin_request();
        info!(
            "📄 Loading catalog page {} (offset {}, limit {}, token {})",
            request.page, request.offset, request.limit, token
        );

        match self.fetch_page(&request).await {
            Ok((total_count, items)) => {
                let item_count = items.len();
                if self.store.commit_page(token, request.page, total_count, items) {
                    info!(
                        "✅ Committed catalog page {}: {} items of {}",
                        request.page, item_count, total_count
                    );
                    Ok(self.store.snapshot())
                } else {
                    warn!("Discarded stale catalog page {} (token {})", request.page, token);
                    Err(SyncError::Superseded { token })
                }
            }
            Err(error) => {
                if self.store.fail_request(token, error.clone()) {
                    warn!("❌ Catalog page {} failed: {}", request.page, error);
                    Err(error)
                } else {
                    debug!("Ignored failure of superseded page {}: {}", request.page, error);
                    Err(SyncError::Superseded { token })
                }
            }
        }
    }

    /// List + detail fan-out; the first failure aborts the whole page
    async fn fetch_page(&self, request: &PageRequest) -> SyncResult<(u32, Vec<ItemRecord>)> {
        let listing = self.remote.fetch_listing(request.limit, request.offset).await?;
        debug!(
            "Listing for page {} returned {} references (total {})",
            request.page,
            listing.results.len(),
            listing.count
        );
        // the first listing is the first time the total is known
        derive_page(request.page, self.paginator.page_size(), listing.count)?;

        let items = try_join_all(listing.results.iter().map(|item_ref| self.fetch_detail(item_ref))).await?;
        Ok((listing.count, items))
    }

    async fn fetch_detail(&self, item_ref: &ItemRef) -> SyncResult<ItemRecord> {
        let _permit = self
            .detail_limiter
            .acquire()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        let raw = self.remote.fetch_item(&item_ref.url).await?;
        let record = normalize(raw)?;
        debug!("Fetched detail of {} (#{})", record.name, record.id);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::fixture_remote::{InMemoryRemote, RemoteCall, detail_url};
    use serde_json::json;

    fn orchestrator(remote: &InMemoryRemote) -> CatalogOrchestrator {
        CatalogOrchestrator::new(
            Arc::new(remote.clone()),
            Arc::new(CatalogStore::new()),
            Paginator::default(),
            4,
        )
    }

    #[tokio::test]
    async fn loads_a_full_page_in_listing_order() {
        let remote = InMemoryRemote::with_generated_catalog(120);
        let catalog = orchestrator(&remote);

        let snapshot = catalog.load_page(2).await.unwrap();
        assert_eq!(snapshot.total_count, 120);
        assert_eq!(snapshot.page, Some(2));
        assert_eq!(snapshot.items.len(), 50);
        assert_eq!(snapshot.items.first().map(|i| i.id), Some(51));
        assert_eq!(snapshot.items.last().map(|i| i.id), Some(100));
        assert!(!snapshot.is_loading);
    }

    #[tokio::test]
    async fn one_failed_detail_aborts_the_page() {
        let remote = InMemoryRemote::with_generated_catalog(120);
        let catalog = orchestrator(&remote);
        catalog.load_page(1).await.unwrap();

        remote.fail(RemoteCall::Item(60), SyncError::Network("timeout".into()));
        let err = catalog.load_page(2).await.unwrap_err();
        assert!(matches!(err, SyncError::Network(_)));

        let snapshot = catalog.store().snapshot();
        assert_eq!(snapshot.page, Some(1));
        assert_eq!(snapshot.items.len(), 50);
        assert_eq!(snapshot.items[0].id, 1);
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.last_error, Some(SyncError::Network("timeout".into())));
    }

    #[tokio::test]
    async fn listing_failure_is_recorded() {
        let remote = InMemoryRemote::with_generated_catalog(10);
        let catalog = orchestrator(&remote);
        remote.fail(
            RemoteCall::Listing { limit: 50, offset: 0 },
            SyncError::Network("refused".into()),
        );

        assert!(catalog.load_page(1).await.is_err());
        let snapshot = catalog.store().snapshot();
        assert!(snapshot.items.is_empty());
        assert!(snapshot.last_error.is_some());
        assert_eq!(remote.call_count(&RemoteCall::Item(1)), 0);
    }

    #[tokio::test]
    async fn malformed_detail_is_a_validation_failure() {
        let remote = InMemoryRemote::with_generated_catalog(3);
        remote.insert_item(2, json!({"id": 2, "name": "broken", "sprites": 42}));
        let catalog = orchestrator(&remote);

        assert!(matches!(catalog.load_page(1).await, Err(SyncError::Validation(_))));
        assert!(catalog.store().snapshot().items.is_empty());
    }

    #[tokio::test]
    async fn out_of_range_page_issues_no_fetch() {
        let remote = InMemoryRemote::with_generated_catalog(60);
        let catalog = orchestrator(&remote);
        catalog.load_page(1).await.unwrap();
        let calls_before = remote.calls().len();

        let err = catalog.load_page(5).await.unwrap_err();
        assert_eq!(err, SyncError::OutOfRange { requested: 5, max_page: 2 });
        assert!(catalog.load_page(0).await.is_err());
        assert_eq!(remote.calls().len(), calls_before);
        assert_eq!(catalog.store().snapshot().page, Some(1));
    }

    #[tokio::test]
    async fn first_load_past_the_end_is_not_committed() {
        let remote = InMemoryRemote::with_generated_catalog(60);
        let catalog = orchestrator(&remote);

        let err = catalog.load_page(5).await.unwrap_err();
        assert_eq!(err, SyncError::OutOfRange { requested: 5, max_page: 2 });
        assert_eq!(remote.call_count(&RemoteCall::Listing { limit: 50, offset: 200 }), 1);
        assert!(remote.calls().iter().all(|c| !matches!(c, RemoteCall::Item(_))));

        let snapshot = catalog.store().snapshot();
        assert_eq!(snapshot.page, None);
        assert!(snapshot.items.is_empty());
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.last_error, Some(err));

        // navigation still starts from the first page
        let first = catalog.next_page().await.unwrap();
        assert_eq!(first.page, Some(1));
        assert_eq!(first.total_count, 60);
        assert!(first.last_error.is_none());
        assert_eq!(catalog.next_page().await.unwrap().page, Some(2));
    }

    #[tokio::test]
    async fn next_and_previous_navigate_from_committed_page() {
        let remote = InMemoryRemote::with_generated_catalog(120);
        let catalog = orchestrator(&remote);

        assert!(catalog.previous_page().await.is_err());
        assert_eq!(catalog.next_page().await.unwrap().page, Some(1));
        assert_eq!(catalog.next_page().await.unwrap().page, Some(2));
        assert_eq!(catalog.previous_page().await.unwrap().page, Some(1));
        assert!(catalog.previous_page().await.is_err());
    }

    #[tokio::test]
    async fn detail_handles_come_from_the_listing() {
        let remote = InMemoryRemote::with_generated_catalog(2);
        let catalog = orchestrator(&remote);
        catalog.load_page(1).await.unwrap();
        assert_eq!(remote.call_count(&RemoteCall::Item(1)), 1);
        assert_eq!(remote.call_count(&RemoteCall::Item(2)), 1);
        assert_eq!(detail_url(2), "memory://catalog/pokemon/2/");
    }
}
