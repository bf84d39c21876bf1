//! The notification REST surface as a trait.

use async_trait::async_trait;

use visadesk_core::types::id::NotificationId;
use visadesk_core::types::pagination::{PageRequest, PageResponse};
use visadesk_entity::Notification;

use crate::error::ApiResult;

/// Operations the engine consumes from the backend.
#[async_trait]
pub trait NotificationApi: Send + Sync + std::fmt::Debug + 'static {
    /// Fetch one page of the current user's notifications, newest first.
    async fn list(&self, page: PageRequest) -> ApiResult<PageResponse<Notification>>;

    /// Set the read flag of a single notification.
    ///
    /// Returns the server's copy when the response carries one.
    async fn mark_read(
        &self,
        id: &NotificationId,
        is_read: bool,
    ) -> ApiResult<Option<Notification>>;

    /// Mark every notification of the session user as read.
    ///
    /// Returns the number of updated entries when the server reports it.
    async fn mark_all_read(&self) -> ApiResult<Option<u64>>;

    /// Delete a single notification.
    async fn delete(&self, id: &NotificationId) -> ApiResult<()>;
}
