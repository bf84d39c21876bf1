//! Comment presentation policies.

pub mod ordering;

pub use ordering::CommentOrdering;
