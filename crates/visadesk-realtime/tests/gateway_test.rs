//! Integration tests for optimistic mutations.

mod helpers;

use std::sync::Arc;

use tokio::sync::Notify;

use visadesk_client::ApiError;
use visadesk_realtime::metrics::RealtimeMetrics;
use visadesk_realtime::{MutationError, MutationGateway, NotificationStore};

use helpers::MockApi;

struct Harness {
    api: Arc<MockApi>,
    store: Arc<NotificationStore>,
    gateway: MutationGateway,
    settle: Arc<Notify>,
    metrics: Arc<RealtimeMetrics>,
}

fn harness() -> Harness {
    let mut b = helpers::dated("b", 20);
    b.is_read = true;
    let items = vec![helpers::dated("c", 30), b, helpers::dated("a", 10)];
    let api = MockApi::with_items(items.clone());
    let store = helpers::store();
    store.replace_all(items);

    let settle = Arc::new(Notify::new());
    let metrics = Arc::new(RealtimeMetrics::new());
    let gateway = MutationGateway::new(api.clone(), store.clone(), settle.clone(), metrics.clone());
    Harness {
        api,
        store,
        gateway,
        settle,
        metrics,
    }
}

fn ids(store: &NotificationStore) -> Vec<String> {
    store
        .notifications()
        .into_iter()
        .map(|n| n.id.into_inner())
        .collect()
}

#[tokio::test]
async fn test_mark_read_confirms_and_requests_settle() {
    let h = harness();
    assert_eq!(h.store.unread_count(), 2);

    h.gateway.mark_as_read(&"a".into()).await.expect("mark read");

    assert!(h.store.get(&"a".into()).expect("present").is_read);
    assert_eq!(h.store.unread_count(), 1);
    assert_eq!(h.api.calls(), vec!["mark_read a true".to_string()]);
    assert_eq!(h.metrics.snapshot().mutations_committed, 1);

    // The settle request is stored as a permit.
    tokio::time::timeout(std::time::Duration::from_secs(1), h.settle.notified())
        .await
        .expect("settle requested");
}

#[tokio::test]
async fn test_failed_mark_read_rolls_back_with_typed_error() {
    let h = harness();
    h.api.fail_mutations(Some(ApiError::from_status(503, "maintenance")));
    let before = h.store.snapshot();

    let err = h.gateway.mark_as_read(&"a".into()).await.expect_err("must fail");

    assert!(matches!(err, MutationError::Server(_)));
    assert!(err.is_retryable());
    assert!(!h.store.get(&"a".into()).expect("present").is_read);
    assert_eq!(h.store.snapshot(), before);
    assert_eq!(h.store.unread_count(), h.store.recount_unread());
    assert_eq!(h.metrics.snapshot().mutations_rolled_back, 1);
}

#[tokio::test]
async fn test_auth_failure_surfaces_auth_error() {
    let h = harness();
    h.api.fail_mutations(Some(ApiError::from_status(401, "expired")));

    let err = h.gateway.mark_all_as_read().await.expect_err("must fail");

    assert!(matches!(err, MutationError::Auth(_)));
    assert!(!err.is_retryable());
    assert_eq!(h.store.unread_count(), 2);
    assert!(h.store.get(&"b".into()).expect("present").is_read);
}

#[tokio::test]
async fn test_network_failure_on_mark_all_restores_only_unread_flags() {
    let h = harness();
    h.api.fail_mutations(Some(ApiError::Network("offline".into())));

    let err = h.gateway.mark_all_as_read().await.expect_err("must fail");

    assert!(matches!(err, MutationError::Network(_)));
    let unread: Vec<_> = h
        .store
        .notifications()
        .into_iter()
        .filter(|n| n.is_unread())
        .map(|n| n.id.into_inner())
        .collect();
    assert_eq!(unread, vec!["c".to_string(), "a".to_string()]);
}

#[tokio::test]
async fn test_not_found_counts_as_success() {
    let h = harness();
    h.api.fail_mutations(Some(ApiError::NotFound("gone".into())));

    h.gateway.delete(&"b".into()).await.expect("already gone is fine");
    h.gateway.mark_as_read(&"a".into()).await.expect("already gone is fine");

    assert_eq!(ids(&h.store), vec!["c".to_string()]);
    assert!(h.store.is_deleted(&"a".into()));
    assert_eq!(h.metrics.snapshot().mutations_committed, 2);
}

#[tokio::test]
async fn test_failed_delete_restores_entry_in_place() {
    let h = harness();
    h.api.fail_mutations(Some(ApiError::from_status(500, "boom")));

    let err = h.gateway.delete(&"b".into()).await.expect_err("must fail");

    assert!(matches!(err, MutationError::Server(_)));
    assert_eq!(ids(&h.store), vec!["c".to_string(), "b".to_string(), "a".to_string()]);
    assert!(!h.store.is_deleted(&"b".into()));

    // A later push for the restored entry still applies.
    let mut edited = h.store.get(&"b".into()).expect("present");
    edited.message = "edited".into();
    h.store.upsert(edited);
    assert_eq!(h.store.get(&"b".into()).expect("present").message, "edited");
}

#[tokio::test]
async fn test_delete_confirms_and_blocks_stale_replays() {
    let h = harness();

    h.gateway.delete(&"c".into()).await.expect("delete");

    assert_eq!(ids(&h.store), vec!["b".to_string(), "a".to_string()]);
    assert_eq!(h.store.unread_count(), 1);

    // A late create for the deleted id is ignored.
    h.store.upsert(helpers::note("c"));
    assert!(h.store.get(&"c".into()).is_none());
}

/// Wait until the mock has recorded `call`, then remove `id` the way a push
/// delete would and let the held request finish.
async fn push_delete_during(h: &Harness, gate: &Notify, call: &str, id: &str) {
    while !h.api.calls().iter().any(|c| c == call) {
        tokio::task::yield_now().await;
    }
    h.store.remove(&id.into());
    gate.notify_one();
}

#[tokio::test]
async fn test_push_delete_during_failed_mark_read_stays_deleted() {
    let h = harness();
    h.api.fail_mutations(Some(ApiError::from_status(500, "boom")));
    let gate = h.api.gate_mutations();

    let id = "a".into();
    let (result, ()) = tokio::join!(
        h.gateway.mark_as_read(&id),
        push_delete_during(&h, &gate, "mark_read a true", "a"),
    );

    assert!(matches!(result, Err(MutationError::Server(_))));
    assert!(h.store.get(&"a".into()).is_none());
    assert!(h.store.is_deleted(&"a".into()));
    assert_eq!(ids(&h.store), vec!["c".to_string(), "b".to_string()]);
    assert_eq!(h.store.unread_count(), h.store.recount_unread());

    // The server's delete still blocks late replays.
    h.store.upsert(helpers::note("a"));
    assert!(h.store.get(&"a".into()).is_none());
}

#[tokio::test]
async fn test_push_delete_during_failed_delete_stays_deleted() {
    let h = harness();
    h.api.fail_mutations(Some(ApiError::Network("offline".into())));
    let gate = h.api.gate_mutations();

    let id = "c".into();
    let (result, ()) = tokio::join!(
        h.gateway.delete(&id),
        push_delete_during(&h, &gate, "delete c", "c"),
    );

    assert!(matches!(result, Err(MutationError::Network(_))));
    assert_eq!(ids(&h.store), vec!["b".to_string(), "a".to_string()]);
    assert!(h.store.is_deleted(&"c".into()));
}

#[tokio::test]
async fn test_failed_delete_is_announced_as_restored() {
    use visadesk_realtime::StoreChange;

    let h = harness();
    h.api.fail_mutations(Some(ApiError::from_status(500, "boom")));
    let mut changes = h.store.subscribe();

    h.gateway.delete(&"a".into()).await.expect_err("must fail");

    assert_eq!(changes.recv().await.ok(), Some(StoreChange::Removed("a".into())));
    assert!(matches!(changes.recv().await, Ok(StoreChange::Restored(n)) if n.id.as_str() == "a"));
    assert!(changes.try_recv().is_err());
}
