//! Push event schemas and validation.

pub mod types;
pub mod validator;

pub use types::{NotificationEvent, PushEventKind, RawPushEvent};
pub use validator::validate_event;
