//! Notification domain entities.

pub mod category;
pub mod model;
pub mod preference;
pub mod severity;

pub use category::NotificationCategory;
pub use model::{Notification, NotificationPatch};
pub use preference::{DeliveryPreferences, PreferencesPatch};
pub use severity::NotificationSeverity;
