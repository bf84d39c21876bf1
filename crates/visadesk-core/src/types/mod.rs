//! Shared types: identifiers and pagination.

pub mod id;
pub mod pagination;

pub use id::{CommentId, DocumentId, LeadId, NotificationId};
pub use pagination::{PageRequest, PageResponse};
