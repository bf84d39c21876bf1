//! Reconciliation of the store with the authoritative REST listing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use visadesk_client::{ApiResult, NotificationApi};
use visadesk_core::types::id::NotificationId;
use visadesk_core::types::pagination::PageRequest;
use visadesk_entity::Notification;

use super::store::{ApplyOutcome, MergeOp, NotificationStore};

/// Upper bound on pages fetched in one pass.
const MAX_PAGES: u64 = 20;

/// Compute the merge ops that bring `current` in line with `fetched`.
///
/// Unknown or changed entries become upserts, applied oldest first so the
/// store keeps newest-first order. Entries missing from a `complete`
/// listing are evicted, except ids in `protected` (inserted after the
/// listing was requested). Evictions leave no tombstone, so a later push or
/// listing can bring the entry back.
pub fn diff(
    current: &[Notification],
    fetched: &[Notification],
    complete: bool,
    protected: &HashSet<NotificationId>,
) -> Vec<MergeOp> {
    let known: HashMap<&NotificationId, &Notification> = current.iter().map(|n| (&n.id, n)).collect();

    let mut ops: Vec<MergeOp> = fetched
        .iter()
        .rev()
        .filter(|n| known.get(&n.id).is_none_or(|existing| *existing != *n))
        .map(|n| MergeOp::Upsert(n.clone()))
        .collect();

    if complete {
        let listed: HashSet<&NotificationId> = fetched.iter().map(|n| &n.id).collect();
        ops.extend(
            current
                .iter()
                .filter(|n| !listed.contains(&n.id) && !protected.contains(&n.id))
                .map(|n| MergeOp::Evict(n.id.clone())),
        );
    }

    ops
}

/// Counts of what a reconciliation pass changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Entries returned by the server.
    pub fetched: usize,
    /// Entries inserted or replaced.
    pub upserted: usize,
    /// Entries removed.
    pub removed: usize,
    /// Whether the listing covered the whole collection.
    pub complete: bool,
}

/// Fetches the notification listing and merges it into the store.
#[derive(Debug)]
pub struct Reconciler {
    api: Arc<dyn NotificationApi>,
    store: Arc<NotificationStore>,
    page_size: u64,
}

impl Reconciler {
    /// Creates a reconciler fetching `page_size` entries per request.
    pub fn new(api: Arc<dyn NotificationApi>, store: Arc<NotificationStore>, page_size: u64) -> Self {
        Self {
            api,
            store,
            page_size,
        }
    }

    /// Fetch pages until the listing is exhausted or the page cap is hit.
    /// Returns the items and whether they form the complete collection.
    ///
    /// Without a `total` the listing only counts as complete once a page
    /// comes back short.
    async fn fetch(&self) -> ApiResult<(Vec<Notification>, bool)> {
        let mut request = PageRequest::first(self.page_size);
        let mut response = self.api.list(request).await?;
        let total = response.total;
        let mut received = response.received();
        let mut more = response.has_next();
        let mut items = std::mem::take(&mut response.items);

        while more && request.page < MAX_PAGES {
            request = PageRequest::new(request.page + 1, self.page_size);
            let mut next = self.api.list(request).await?;
            if next.received() == 0 {
                more = false;
                break;
            }
            received += next.received();
            more = next.has_next();
            items.append(&mut next.items);
        }

        let complete = !more && total.is_none_or(|total| received >= total);
        Ok((items, complete))
    }

    /// Merge the server listing into the store.
    pub async fn sync(&self) -> ApiResult<ReconcileReport> {
        let baseline = self.store.revision();
        let (fetched, complete) = self.fetch().await?;
        let protected = self.store.inserted_after(baseline);
        let ops = diff(&self.store.notifications(), &fetched, complete, &protected);

        let mut report = ReconcileReport {
            fetched: fetched.len(),
            complete,
            ..Default::default()
        };
        for op in ops {
            match self.store.apply(op) {
                ApplyOutcome::Inserted | ApplyOutcome::Updated => report.upserted += 1,
                ApplyOutcome::Removed => report.removed += 1,
                ApplyOutcome::Unchanged | ApplyOutcome::Ignored => {}
            }
        }

        debug!(
            fetched = report.fetched,
            upserted = report.upserted,
            removed = report.removed,
            complete,
            "Reconciled notifications with server"
        );
        Ok(report)
    }

    /// Replace the store contents with the server listing, raising the
    /// loading flag while the request is in flight.
    pub async fn reload(&self) -> ApiResult<usize> {
        self.store.set_loading(true);
        let result = self.fetch().await.map(|(items, _)| {
            let count = items.len();
            self.store.replace_all(items);
            count
        });
        self.store.set_loading(false);
        result
    }
}
