//! Notification state: store, merge rules, dispatch, alerts, and preferences.

pub mod alert;
pub mod dispatcher;
pub mod preferences;
pub mod reconcile;
pub mod store;

pub use alert::{AlertChannels, AlertSink, LogAlertSink};
pub use dispatcher::EventDispatcher;
pub use preferences::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use reconcile::Reconciler;
pub use store::{ApplyOutcome, MergeOp, NotificationStore, StoreChange, StoreSnapshot};
