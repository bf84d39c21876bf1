//! # visadesk-service
//!
//! Data-shaping policies used by the portal views. Both are driven by
//! configuration rather than fixed constants:
//!
//! - [`CommentOrdering`]: pinned authors first, then newest first
//! - [`ReviewPolicy`]: age-based triage of outstanding document requests

pub mod comment;
pub mod document;

pub use comment::CommentOrdering;
pub use document::{ReviewPolicy, ReviewUrgency, TriagedDocument};
