//! # visadesk-client
//!
//! Client for the portal's notification REST surface:
//!
//! - `GET /notifications`: paginated list
//! - `PUT /notifications/read`: mark one notification
//! - `POST /notifications/read-all`: mark everything read
//! - `DELETE /notifications`: delete one notification
//!
//! The engine depends on the [`NotificationApi`] trait only, so tests and
//! offline tools can substitute their own implementation.

pub mod api;
pub mod error;
pub mod http;
pub mod types;
pub mod wire;

pub use api::NotificationApi;
pub use error::{ApiError, ApiResult};
pub use http::HttpNotificationApi;
pub use wire::{DecodeError, decode_notification, decode_patch};
