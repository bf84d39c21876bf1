//! Snapshot, apply, then commit or roll back.

use tracing::debug;

use visadesk_core::types::id::NotificationId;

use crate::notification::store::NotificationStore;

/// A resource whose relevant state can be saved and restored.
pub trait Checkpoint {
    /// Which part of the state a mutation touches.
    type Scope;
    /// Saved state for that scope.
    type Saved;

    /// Save the state covered by `scope`.
    fn checkpoint(&self, scope: &Self::Scope) -> Self::Saved;

    /// Put the state covered by `scope` back.
    fn restore(&self, scope: &Self::Scope, saved: Self::Saved);
}

/// Part of the store a mutation touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationScope {
    /// The read flag of one notification.
    Read(NotificationId),
    /// Presence of one notification.
    Delete(NotificationId),
    /// The read flag of every notification.
    All,
}

/// Saved store state for a [`MutationScope`].
#[derive(Debug, Clone)]
pub enum StoreCheckpoint {
    /// Read flag before the change, `None` when the entry was absent.
    Read(Option<bool>),
    /// Position and value of the entry, plus how often it had been removed.
    Deleted {
        entry: Option<(usize, visadesk_entity::Notification)>,
        removals: u32,
    },
    /// Ids that were unread.
    Unread(Vec<NotificationId>),
}

impl Checkpoint for NotificationStore {
    type Scope = MutationScope;
    type Saved = StoreCheckpoint;

    fn checkpoint(&self, scope: &MutationScope) -> StoreCheckpoint {
        match scope {
            MutationScope::Read(id) => StoreCheckpoint::Read(self.read_flag(id)),
            MutationScope::Delete(id) => {
                let (entry, removals) = self.delete_checkpoint(id);
                StoreCheckpoint::Deleted { entry, removals }
            }
            MutationScope::All => StoreCheckpoint::Unread(self.unread_ids()),
        }
    }

    fn restore(&self, scope: &MutationScope, saved: StoreCheckpoint) {
        match (scope, saved) {
            (MutationScope::Read(id), StoreCheckpoint::Read(was_read)) => {
                self.restore_read_flag(id, was_read);
            }
            (MutationScope::Delete(id), StoreCheckpoint::Deleted { entry, removals }) => {
                self.restore_deleted(id, entry, removals);
            }
            (MutationScope::All, StoreCheckpoint::Unread(ids)) => self.restore_unread(&ids),
            _ => debug!("Checkpoint does not match its scope; nothing restored"),
        }
    }
}

/// An optimistic change that is rolled back unless committed.
///
/// Dropping an uncommitted transaction rolls it back.
#[must_use = "an uncommitted transaction rolls back when dropped"]
pub struct OptimisticTransaction<'a, S: Checkpoint> {
    target: &'a S,
    scope: S::Scope,
    saved: Option<S::Saved>,
}

impl<'a, S: Checkpoint> OptimisticTransaction<'a, S> {
    /// Save the state covered by `scope`.
    pub fn begin(target: &'a S, scope: S::Scope) -> Self {
        let saved = target.checkpoint(&scope);
        Self {
            target,
            scope,
            saved: Some(saved),
        }
    }

    /// Apply the optimistic change.
    pub fn apply<R>(&self, change: impl FnOnce(&S) -> R) -> R {
        change(self.target)
    }

    /// Keep the change.
    pub fn commit(mut self) {
        self.saved = None;
    }

    /// Undo the change.
    pub fn rollback(mut self) {
        self.undo();
    }

    fn undo(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.target.restore(&self.scope, saved);
        }
    }
}

impl<S: Checkpoint> Drop for OptimisticTransaction<'_, S> {
    fn drop(&mut self) {
        self.undo();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Counter(Cell<i32>);

    impl Checkpoint for Counter {
        type Scope = ();
        type Saved = i32;

        fn checkpoint(&self, _: &()) -> i32 {
            self.0.get()
        }

        fn restore(&self, _: &(), saved: i32) {
            self.0.set(saved);
        }
    }

    #[test]
    fn test_commit_keeps_change() {
        let counter = Counter(Cell::new(1));
        let tx = OptimisticTransaction::begin(&counter, ());
        tx.apply(|c| c.0.set(2));
        tx.commit();
        assert_eq!(counter.0.get(), 2);
    }

    #[test]
    fn test_rollback_and_drop_restore() {
        let counter = Counter(Cell::new(1));
        let tx = OptimisticTransaction::begin(&counter, ());
        tx.apply(|c| c.0.set(2));
        tx.rollback();
        assert_eq!(counter.0.get(), 1);

        {
            let tx = OptimisticTransaction::begin(&counter, ());
            tx.apply(|c| c.0.set(5));
        }
        assert_eq!(counter.0.get(), 1);
    }
}
