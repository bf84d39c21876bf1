//! # visadesk-entity
//!
//! Domain entity models shared by the client, the realtime engine and the
//! CLI. Entities carry their camelCase wire representation.

pub mod comment;
pub mod document;
pub mod notification;

pub use comment::Comment;
pub use document::RequestedDocument;
pub use notification::{
    DeliveryPreferences, Notification, NotificationCategory, NotificationPatch,
    NotificationSeverity, PreferencesPatch,
};
