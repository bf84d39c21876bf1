//! In-memory notification store.
//!
//! Every writer goes through [`NotificationStore::apply`] (or one of the few
//! bulk helpers), so push events, poll results and optimistic mutations all
//! share one set of merge rules:
//!
//! - no two entries share an id
//! - new entries go to the head, updates replace in place
//! - a removed id is tombstoned and later upserts for it are ignored
//! - the unread counter always equals a full scan

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use visadesk_core::result::AppResult;
use visadesk_core::types::id::NotificationId;
use visadesk_entity::{DeliveryPreferences, Notification, NotificationPatch, PreferencesPatch};

use super::preferences::PreferenceStore;

/// Maximum number of remembered deletions.
const TOMBSTONE_CAPACITY: usize = 4096;

/// Default capacity of the change feed.
pub const DEFAULT_CHANGE_BUFFER: usize = 256;

/// A single merge operation.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOp {
    /// Insert at the head, or replace the entry with the same id in place.
    Upsert(Notification),
    /// Merge fields into an existing entry. When the id is unknown,
    /// `fallback` is inserted instead; without one the op is ignored.
    Patch {
        /// Target notification.
        id: NotificationId,
        /// Fields to overwrite.
        patch: NotificationPatch,
        /// Full body to insert when the target is unknown.
        fallback: Option<Notification>,
    },
    /// Remove the entry and tombstone its id.
    Remove(NotificationId),
    /// Drop the entry without a tombstone. Used when a listing no longer
    /// contains it but the server never sent a delete.
    Evict(NotificationId),
}

/// What a merge operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOutcome {
    /// A new entry was added.
    Inserted,
    /// An existing entry changed.
    Updated,
    /// An entry was removed.
    Removed,
    /// The op matched the current state exactly.
    Unchanged,
    /// The op targets a deleted id, or an unknown id without a full body.
    Ignored,
}

/// Change feed item.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    /// A notification was added.
    Inserted(Notification),
    /// A notification changed; carries the new value.
    Updated(Notification),
    /// A notification was removed.
    Removed(NotificationId),
    /// A rolled-back delete put a notification back.
    Restored(Notification),
    /// The whole list was replaced.
    Reset,
    /// The loading flag changed.
    Loading(bool),
}

/// Serializable view of the store for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    /// Notifications, newest first.
    pub notifications: Vec<Notification>,
    /// Number of unread notifications.
    pub unread_count: usize,
    /// Whether a full load is in progress.
    pub loading: bool,
}

/// Bounded FIFO set of deleted ids.
///
/// Each id also counts the removals applied to it, so a rollback can tell
/// its own removal apart from one made by another writer.
#[derive(Debug, Default, Clone)]
struct Tombstones {
    order: VecDeque<NotificationId>,
    removals: HashMap<NotificationId, u32>,
}

impl Tombstones {
    fn contains(&self, id: &NotificationId) -> bool {
        self.removals.contains_key(id)
    }

    fn removals(&self, id: &NotificationId) -> u32 {
        self.removals.get(id).copied().unwrap_or(0)
    }

    fn insert(&mut self, id: NotificationId) {
        if let Some(count) = self.removals.get_mut(&id) {
            *count += 1;
            return;
        }
        self.removals.insert(id.clone(), 1);
        self.order.push_back(id);
        while self.order.len() > TOMBSTONE_CAPACITY {
            if let Some(evicted) = self.order.pop_front() {
                self.removals.remove(&evicted);
            }
        }
    }

    /// Take back one removal; the tombstone goes away with the last one.
    fn release(&mut self, id: &NotificationId) {
        match self.removals.get_mut(id) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                self.removals.remove(id);
                self.order.retain(|t| t != id);
            }
            None => {}
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    items: Vec<Notification>,
    unread: usize,
    tombstones: Tombstones,
    loading: bool,
    /// Bumped on every insert.
    revision: u64,
    /// Revision at which each entry was inserted.
    inserted_at: HashMap<NotificationId, u64>,
}

impl StoreState {
    fn position(&self, id: &NotificationId) -> Option<usize> {
        self.items.iter().position(|n| &n.id == id)
    }

    fn insert_at(&mut self, index: usize, notification: Notification) {
        self.revision += 1;
        if notification.is_unread() {
            self.unread += 1;
        }
        self.inserted_at.insert(notification.id.clone(), self.revision);
        let index = index.min(self.items.len());
        self.items.insert(index, notification);
    }

    fn replace_at(&mut self, index: usize, notification: Notification) {
        let previous = &self.items[index];
        if previous.is_unread() {
            self.unread -= 1;
        }
        if notification.is_unread() {
            self.unread += 1;
        }
        self.items[index] = notification;
    }

    fn remove_at(&mut self, index: usize) -> Notification {
        let removed = self.items.remove(index);
        if removed.is_unread() {
            self.unread -= 1;
        }
        self.inserted_at.remove(&removed.id);
        removed
    }

    fn upsert(&mut self, notification: Notification) -> (ApplyOutcome, Option<StoreChange>) {
        if self.tombstones.contains(&notification.id) {
            return (ApplyOutcome::Ignored, None);
        }
        match self.position(&notification.id) {
            Some(index) if self.items[index] == notification => (ApplyOutcome::Unchanged, None),
            Some(index) => {
                self.replace_at(index, notification.clone());
                (ApplyOutcome::Updated, Some(StoreChange::Updated(notification)))
            }
            None => {
                self.insert_at(0, notification.clone());
                (ApplyOutcome::Inserted, Some(StoreChange::Inserted(notification)))
            }
        }
    }

    fn apply(&mut self, op: MergeOp) -> (ApplyOutcome, Option<StoreChange>) {
        match op {
            MergeOp::Upsert(notification) => self.upsert(notification),
            MergeOp::Patch { id, patch, fallback } => {
                if self.tombstones.contains(&id) {
                    return (ApplyOutcome::Ignored, None);
                }
                match self.position(&id) {
                    Some(index) => {
                        let merged = patch.apply_to(&self.items[index]);
                        self.upsert(merged)
                    }
                    None => match fallback {
                        Some(full) if full.id == id => self.upsert(full),
                        _ => (ApplyOutcome::Ignored, None),
                    },
                }
            }
            MergeOp::Remove(id) => {
                self.tombstones.insert(id.clone());
                match self.position(&id) {
                    Some(index) => {
                        self.remove_at(index);
                        (ApplyOutcome::Removed, Some(StoreChange::Removed(id)))
                    }
                    None => (ApplyOutcome::Unchanged, None),
                }
            }
            MergeOp::Evict(id) => match self.position(&id) {
                Some(index) => {
                    self.remove_at(index);
                    (ApplyOutcome::Removed, Some(StoreChange::Removed(id)))
                }
                None => (ApplyOutcome::Unchanged, None),
            },
        }
    }
}

/// Holds the current user's notifications and delivery preferences.
pub struct NotificationStore {
    state: Mutex<StoreState>,
    preferences: Mutex<DeliveryPreferences>,
    /// Serializes preference writers across the save `.await`.
    preference_writes: tokio::sync::Mutex<()>,
    preference_store: Arc<dyn PreferenceStore>,
    changes: broadcast::Sender<StoreChange>,
}

impl NotificationStore {
    /// Creates an empty store with the given preferences.
    pub fn new(
        preference_store: Arc<dyn PreferenceStore>,
        preferences: DeliveryPreferences,
        change_buffer: usize,
    ) -> Self {
        let (changes, _) = broadcast::channel(change_buffer.max(1));
        Self {
            state: Mutex::new(StoreState::default()),
            preferences: Mutex::new(preferences),
            preference_writes: tokio::sync::Mutex::new(()),
            preference_store,
            changes,
        }
    }

    /// Creates an empty store with preferences loaded from `preference_store`.
    pub async fn load(preference_store: Arc<dyn PreferenceStore>, change_buffer: usize) -> AppResult<Self> {
        let preferences = preference_store.load().await?;
        Ok(Self::new(preference_store, preferences, change_buffer))
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, change: Option<StoreChange>) {
        if let Some(change) = change {
            // No receivers is fine.
            let _ = self.changes.send(change);
        }
    }

    /// Apply one merge operation.
    pub fn apply(&self, op: MergeOp) -> ApplyOutcome {
        let mut state = self.state();
        let (outcome, change) = state.apply(op);
        self.publish(change);
        outcome
    }

    /// Insert or replace a notification.
    pub fn upsert(&self, notification: Notification) -> ApplyOutcome {
        self.apply(MergeOp::Upsert(notification))
    }

    /// Remove a notification. Idempotent.
    pub fn remove(&self, id: &NotificationId) -> ApplyOutcome {
        self.apply(MergeOp::Remove(id.clone()))
    }

    /// Mark one notification read locally. Returns whether anything changed.
    pub fn mark_read(&self, id: &NotificationId) -> bool {
        let outcome = self.apply(MergeOp::Patch {
            id: id.clone(),
            patch: NotificationPatch {
                is_read: Some(true),
                ..Default::default()
            },
            fallback: None,
        });
        outcome == ApplyOutcome::Updated
    }

    /// Mark every notification read locally. Returns how many changed.
    pub fn mark_all_read(&self) -> usize {
        let mut state = self.state();
        let mut changed = 0;
        for index in 0..state.items.len() {
            if state.items[index].is_unread() {
                let mut read = state.items[index].clone();
                read.is_read = true;
                state.replace_at(index, read.clone());
                self.publish(Some(StoreChange::Updated(read)));
                changed += 1;
            }
        }
        changed
    }

    /// Replace the whole list, sorted newest-created first. Deleted ids and
    /// duplicate ids are dropped.
    pub fn replace_all(&self, notifications: Vec<Notification>) {
        let mut state = self.state();
        let mut seen = HashSet::new();
        let mut items: Vec<Notification> = notifications
            .into_iter()
            .filter(|n| !state.tombstones.contains(&n.id) && seen.insert(n.id.clone()))
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        state.revision += 1;
        let revision = state.revision;
        state.inserted_at = items.iter().map(|n| (n.id.clone(), revision)).collect();
        state.unread = items.iter().filter(|n| n.is_unread()).count();
        state.items = items;
        debug!(count = state.items.len(), unread = state.unread, "Notification list replaced");
        self.publish(Some(StoreChange::Reset));
    }

    /// All notifications, newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.state().items.clone()
    }

    /// Look up one notification.
    pub fn get(&self, id: &NotificationId) -> Option<Notification> {
        let state = self.state();
        state.position(id).map(|i| state.items[i].clone())
    }

    /// Number of notifications.
    pub fn len(&self) -> usize {
        self.state().items.len()
    }

    /// Whether the store holds no notifications.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maintained unread counter.
    pub fn unread_count(&self) -> usize {
        self.state().unread
    }

    /// Unread count by full scan.
    pub fn recount_unread(&self) -> usize {
        self.state().items.iter().filter(|n| n.is_unread()).count()
    }

    /// Whether `id` was deleted.
    pub fn is_deleted(&self, id: &NotificationId) -> bool {
        self.state().tombstones.contains(id)
    }

    /// Current insert revision.
    pub fn revision(&self) -> u64 {
        self.state().revision
    }

    /// Ids inserted after `revision`.
    pub fn inserted_after(&self, revision: u64) -> HashSet<NotificationId> {
        self.state()
            .inserted_at
            .iter()
            .filter(|(_, rev)| **rev > revision)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Set the loading flag.
    pub fn set_loading(&self, loading: bool) {
        let mut state = self.state();
        if state.loading != loading {
            state.loading = loading;
            self.publish(Some(StoreChange::Loading(loading)));
        }
    }

    /// Whether a full load is in progress.
    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    /// Consistent view of list, unread count and loading flag.
    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state();
        StoreSnapshot {
            notifications: state.items.clone(),
            unread_count: state.unread,
            loading: state.loading,
        }
    }

    /// Subscribe to the change feed.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    /// Current delivery preferences.
    pub fn preferences(&self) -> DeliveryPreferences {
        *self.preferences.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Merge `patch` into the preferences and persist them. The in-memory
    /// value only changes once the save succeeded.
    pub async fn set_preferences(&self, patch: PreferencesPatch) -> AppResult<DeliveryPreferences> {
        let _writer = self.preference_writes.lock().await;
        let merged = self.preferences().merged(&patch);
        self.preference_store.save(&merged).await?;
        *self.preferences.lock().unwrap_or_else(|e| e.into_inner()) = merged;
        debug!(
            sound = merged.sound_enabled,
            desktop = merged.desktop_enabled,
            "Delivery preferences updated"
        );
        Ok(merged)
    }

    // Rollback support for optimistic mutations.

    /// Read flag of an entry, if present.
    pub(crate) fn read_flag(&self, id: &NotificationId) -> Option<bool> {
        let state = self.state();
        state.position(id).map(|i| state.items[i].is_read)
    }

    /// Mark an entry unread again after a failed mark-read. Nothing happens
    /// when it was already read, or has since been removed or deleted.
    pub(crate) fn restore_read_flag(&self, id: &NotificationId, was_read: Option<bool>) {
        if was_read != Some(false) {
            return;
        }
        let mut state = self.state();
        if state.tombstones.contains(id) {
            return;
        }
        let Some(index) = state.position(id) else {
            return;
        };
        if state.items[index].is_read {
            let mut unread = state.items[index].clone();
            unread.is_read = false;
            state.replace_at(index, unread.clone());
            self.publish(Some(StoreChange::Updated(unread)));
        }
    }

    /// Position and value of an entry plus the removals recorded for its id.
    pub(crate) fn delete_checkpoint(&self, id: &NotificationId) -> (Option<(usize, Notification)>, u32) {
        let state = self.state();
        let entry = state.position(id).map(|i| (i, state.items[i].clone()));
        (entry, state.tombstones.removals(id))
    }

    /// Undo one removal of `id` made after
    /// [`delete_checkpoint`](Self::delete_checkpoint). If any other writer
    /// removed the id in the meantime the delete stands.
    pub(crate) fn restore_deleted(
        &self,
        id: &NotificationId,
        saved: Option<(usize, Notification)>,
        removals_before: u32,
    ) {
        let mut state = self.state();
        if state.tombstones.removals(id) != removals_before + 1 {
            debug!(notification_id = %id, "Notification deleted elsewhere; keeping the delete");
            return;
        }
        state.tombstones.release(id);
        let Some((index, notification)) = saved else {
            return;
        };
        if state.position(id).is_none() {
            state.insert_at(index, notification.clone());
            self.publish(Some(StoreChange::Restored(notification)));
        }
    }

    /// Ids of unread notifications.
    pub(crate) fn unread_ids(&self) -> Vec<NotificationId> {
        self.state()
            .items
            .iter()
            .filter(|n| n.is_unread())
            .map(|n| n.id.clone())
            .collect()
    }

    /// Mark the given notifications unread again, where still present.
    pub(crate) fn restore_unread(&self, ids: &[NotificationId]) {
        let mut state = self.state();
        for id in ids {
            if let Some(index) = state.position(id) {
                if !state.items[index].is_unread() {
                    let mut unread = state.items[index].clone();
                    unread.is_read = false;
                    state.replace_at(index, unread.clone());
                    self.publish(Some(StoreChange::Updated(unread)));
                }
            }
        }
    }
}

impl std::fmt::Debug for NotificationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("NotificationStore")
            .field("len", &state.items.len())
            .field("unread", &state.unread)
            .field("loading", &state.loading)
            .finish()
    }
}
