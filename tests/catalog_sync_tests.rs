//! Catalog paging against the in-memory remote: bounds, page sizes and the stale-response guard
use pokedex_sync_lib::infrastructure::{InMemoryRemote, RemoteCall};
use pokedex_sync_lib::{PokedexSync, ShellIntent, SyncError, SyncOptions};
use rstest::rstest;
use std::sync::Arc;

fn core(remote: &InMemoryRemote) -> Arc<PokedexSync> {
    Arc::new(PokedexSync::new(
        Arc::new(remote.clone()),
        Arc::new(remote.clone()),
        SyncOptions::default(),
    ))
}

async fn wait_for_call(remote: &InMemoryRemote, call: &RemoteCall) {
    while remote.call_count(call) == 0 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn trailing_empty_page_and_rejected_page_past_it() {
    let remote = InMemoryRemote::with_generated_catalog(650);
    let sync = core(&remote);

    let page14 = sync.catalog().load_page(14).await.unwrap();
    assert_eq!(page14.total_count, 650);
    assert_eq!(page14.page, Some(14));
    assert!(page14.items.is_empty());
    assert!(page14.last_error.is_none());
    assert!(remote.calls().contains(&RemoteCall::Listing { limit: 50, offset: 650 }));

    let calls_before = remote.calls().len();
    let err = sync.catalog().load_page(15).await.unwrap_err();
    assert_eq!(err, SyncError::OutOfRange { requested: 15, max_page: 14 });
    assert_eq!(remote.calls().len(), calls_before);
    assert_eq!(sync.catalog_snapshot(), page14);
}

#[rstest]
#[case(650, 1, 50)]
#[case(650, 13, 50)]
#[case(120, 3, 20)]
#[case(7, 1, 7)]
#[case(0, 1, 0)]
#[tokio::test]
async fn page_holds_min_of_page_size_and_remaining(#[case] total: u32, #[case] page: u32, #[case] expected: usize) {
    let remote = InMemoryRemote::with_generated_catalog(total);
    let sync = core(&remote);

    let snapshot = sync.catalog().load_page(page).await.unwrap();
    assert_eq!(snapshot.items.len(), expected);
    assert_eq!(snapshot.total_count, total);

    let offset = (page - 1) * 50;
    let ids: Vec<u32> = snapshot.items.iter().map(|item| item.id).collect();
    let expected_ids: Vec<u32> = (offset + 1..=offset + expected as u32).collect();
    assert_eq!(ids, expected_ids);
}

#[tokio::test]
async fn older_page_resolving_last_is_discarded() {
    let remote = InMemoryRemote::with_generated_catalog(300);
    let sync = core(&remote);
    let page2_listing = RemoteCall::Listing { limit: 50, offset: 50 };
    let gate = remote.gate(page2_listing.clone());

    let page2 = tokio::spawn({
        let sync = Arc::clone(&sync);
        async move { sync.dispatch(ShellIntent::LoadPage(2)).await }
    });
    wait_for_call(&remote, &page2_listing).await;

    let page3 = sync.catalog().load_page(3).await.unwrap();
    assert_eq!(page3.page, Some(3));

    gate.release();
    let stale = page2.await.unwrap();
    assert!(matches!(stale, Err(SyncError::Superseded { .. })));

    let snapshot = sync.catalog_snapshot();
    assert_eq!(snapshot.page, Some(3));
    assert_eq!(snapshot.items[0].id, 101);
    assert!(!snapshot.is_loading);
    assert!(snapshot.last_error.is_none());
}

#[tokio::test]
async fn older_page_resolving_first_is_never_committed() {
    let remote = InMemoryRemote::with_generated_catalog(300);
    let sync = core(&remote);
    let page3_listing = RemoteCall::Listing { limit: 50, offset: 100 };
    let gate = remote.gate(page3_listing.clone());
    let page2_listing = RemoteCall::Listing { limit: 50, offset: 50 };
    let page2_gate = remote.gate(page2_listing.clone());

    let page2 = tokio::spawn({
        let sync = Arc::clone(&sync);
        async move { sync.catalog().load_page(2).await }
    });
    wait_for_call(&remote, &page2_listing).await;

    let page3 = tokio::spawn({
        let sync = Arc::clone(&sync);
        async move { sync.catalog().load_page(3).await }
    });
    wait_for_call(&remote, &page3_listing).await;

    // page 2 completes while page 3 is still outstanding
    page2_gate.release();
    assert!(matches!(page2.await.unwrap(), Err(SyncError::Superseded { .. })));
    let pending = sync.catalog_snapshot();
    assert!(pending.is_loading);
    assert_eq!(pending.page, None);

    gate.release();
    let committed = page3.await.unwrap().unwrap();
    assert_eq!(committed.page, Some(3));
    assert!(!sync.catalog_snapshot().is_loading);
}

#[tokio::test]
async fn failed_page_keeps_previous_snapshot() {
    let remote = InMemoryRemote::with_generated_catalog(120);
    let sync = core(&remote);
    let page1 = sync.catalog().load_page(1).await.unwrap();

    remote.fail(RemoteCall::Item(77), SyncError::Network("connection reset".into()));
    assert!(sync.catalog().load_page(2).await.is_err());

    let snapshot = sync.catalog_snapshot();
    assert_eq!(snapshot.items, page1.items);
    assert_eq!(snapshot.page, Some(1));
    assert!(matches!(snapshot.last_error, Some(SyncError::Network(_))));
    assert!(!snapshot.is_loading);
}

#[tokio::test]
async fn subscribers_observe_loading_then_commit() {
    let remote = InMemoryRemote::with_generated_catalog(10);
    let sync = core(&remote);
    let mut updates = sync.catalog().store().subscribe();

    sync.catalog().load_page(1).await.unwrap();

    assert!(updates.has_changed().unwrap());
    let latest = updates.borrow_and_update().clone();
    assert_eq!(latest.items.len(), 10);
    assert!(!latest.is_loading);
}
