//! Property tests for the store merge rules and poll/push convergence.

mod helpers;

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;

use visadesk_entity::{Notification, NotificationPatch};
use visadesk_realtime::message::types::RawPushEvent;
use visadesk_realtime::metrics::RealtimeMetrics;
use visadesk_realtime::notification::reconcile::Reconciler;
use visadesk_realtime::{EventDispatcher, MergeOp, NotificationStore};

use helpers::MockApi;

#[derive(Debug, Clone)]
enum Op {
    Upsert(u8, bool),
    Patch(u8, bool),
    Remove(u8),
    MarkRead(u8),
    MarkAll,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..6, any::<bool>()).prop_map(|(id, read)| Op::Upsert(id, read)),
        2 => (0u8..6, any::<bool>()).prop_map(|(id, read)| Op::Patch(id, read)),
        2 => (0u8..6).prop_map(Op::Remove),
        2 => (0u8..6).prop_map(Op::MarkRead),
        1 => Just(Op::MarkAll),
    ]
}

fn entry(id: u8, read: bool) -> Notification {
    let mut n = helpers::dated(&format!("n{id}"), i64::from(id));
    n.is_read = read;
    n
}

fn run(store: &NotificationStore, op: &Op) {
    match *op {
        Op::Upsert(id, read) => {
            store.upsert(entry(id, read));
        }
        Op::Patch(id, read) => {
            store.apply(MergeOp::Patch {
                id: entry(id, read).id,
                patch: NotificationPatch {
                    is_read: Some(read),
                    ..Default::default()
                },
                fallback: Some(entry(id, read)),
            });
        }
        Op::Remove(id) => {
            store.remove(&entry(id, false).id);
        }
        Op::MarkRead(id) => {
            store.mark_read(&entry(id, false).id);
        }
        Op::MarkAll => {
            store.mark_all_read();
        }
    }
}

fn assert_no_duplicates(store: &NotificationStore) {
    let items = store.notifications();
    let ids: HashSet<_> = items.iter().map(|n| n.id.clone()).collect();
    assert_eq!(ids.len(), items.len(), "duplicate ids in {items:?}");
}

proptest! {
    #[test]
    fn prop_unread_counter_matches_full_scan(ops in prop::collection::vec(op(), 0..60)) {
        let store = helpers::store();
        for op in &ops {
            run(&store, op);
            prop_assert_eq!(store.unread_count(), store.recount_unread());
            assert_no_duplicates(&store);
        }
    }

    #[test]
    fn prop_upsert_is_idempotent(
        ops in prop::collection::vec(op(), 0..30),
        id in 0u8..6,
        read in any::<bool>(),
    ) {
        let once = helpers::store();
        let twice = helpers::store();
        for op in &ops {
            run(&once, op);
            run(&twice, op);
        }

        once.upsert(entry(id, read));
        twice.upsert(entry(id, read));
        twice.upsert(entry(id, read));

        prop_assert_eq!(once.snapshot(), twice.snapshot());
    }

    #[test]
    fn prop_delete_wins(
        before in prop::collection::vec(op(), 0..30),
        after in prop::collection::vec((0u8..2, any::<bool>()), 0..10),
        id in 0u8..6,
    ) {
        let store = helpers::store();
        for op in &before {
            run(&store, op);
        }
        store.remove(&entry(id, false).id);

        // Creates and updates for the same id arriving after the delete.
        for (kind, read) in after {
            let late = if kind == 0 { Op::Upsert(id, read) } else { Op::Patch(id, read) };
            run(&store, &late);
        }

        prop_assert!(store.get(&entry(id, false).id).is_none());
        prop_assert_eq!(store.unread_count(), store.recount_unread());
    }

    #[test]
    fn prop_poll_and_push_converge(actions in prop::collection::vec((0u8..3, any::<u8>()), 1..25)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        runtime.block_on(async {
            let (events, server) = script(&actions);

            let pushed = push_path(&events);
            let polled = poll_path(server).await;

            assert_eq!(pushed.snapshot(), polled.snapshot());
            assert_eq!(
                serde_json::to_vec(&pushed.notifications()).expect("serialize"),
                serde_json::to_vec(&polled.notifications()).expect("serialize"),
            );
        });
    }
}

/// Turn abstract actions into push events and the server listing they
/// leave behind (newest first).
fn script(actions: &[(u8, u8)]) -> (Vec<RawPushEvent>, Vec<Notification>) {
    let mut events = Vec::new();
    let mut live: Vec<Notification> = Vec::new();
    let mut next_id = 0i64;

    for &(kind, pick) in actions {
        match kind {
            0 => {
                let n = helpers::dated(&format!("n{next_id}"), next_id);
                next_id += 1;
                events.push(RawPushEvent::created(&n));
                live.push(n);
            }
            1 if !live.is_empty() => {
                let index = usize::from(pick) % live.len();
                live[index].is_read = !live[index].is_read;
                live[index].message = format!("{} (edited)", live[index].message);
                events.push(RawPushEvent::updated(&live[index]));
            }
            2 if !live.is_empty() => {
                let removed = live.remove(usize::from(pick) % live.len());
                events.push(RawPushEvent::deleted(&removed.id));
            }
            _ => {}
        }
    }

    live.reverse();
    (events, live)
}

fn push_path(events: &[RawPushEvent]) -> Arc<NotificationStore> {
    let store = helpers::store();
    let dispatcher = EventDispatcher::new(store.clone(), Arc::new(RealtimeMetrics::new()));
    for event in events {
        dispatcher.dispatch(event).expect("valid event");
    }
    store
}

async fn poll_path(server: Vec<Notification>) -> Arc<NotificationStore> {
    let store = helpers::store();
    let reconciler = Reconciler::new(MockApi::with_items(server), store.clone(), 100);
    reconciler.sync().await.expect("sync");
    store
}

#[test]
fn test_end_to_end_event_sequence() {
    let store = helpers::store();
    let dispatcher = EventDispatcher::new(store.clone(), Arc::new(RealtimeMetrics::new()));
    let a = helpers::dated("A", 1);
    let b = helpers::dated("B", 2);

    dispatcher.dispatch(&RawPushEvent::created(&a)).expect("created A");
    dispatcher.dispatch(&RawPushEvent::updated(&a)).expect("updated A");
    dispatcher.dispatch(&RawPushEvent::created(&b)).expect("created B");
    dispatcher.dispatch(&RawPushEvent::deleted(&a.id)).expect("deleted A");

    assert_eq!(store.notifications(), vec![b]);
    assert_eq!(store.unread_count(), 1);
    assert_eq!(store.unread_count(), store.recount_unread());
}
