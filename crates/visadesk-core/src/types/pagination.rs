//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// Default page size.
const DEFAULT_PAGE_SIZE: u64 = 25;
/// Maximum page size.
const MAX_PAGE_SIZE: u64 = 500;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// Page number (1-based).
    #[serde(default = "default_page")]
    pub page: u64,
    /// Number of items per page.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

impl PageRequest {
    /// Create a new page request.
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// First page with the given size.
    pub fn first(page_size: u64) -> Self {
        Self::new(1, page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Current page number (1-based).
    #[serde(default = "default_page")]
    pub page: u64,
    /// Number of items per page.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// Total number of items across all pages. Unknown when the server
    /// leaves it out.
    #[serde(default)]
    pub total: Option<u64>,
    /// Server-side unread count, when the endpoint reports it.
    #[serde(default)]
    pub unread_count: Option<u64>,
    /// Items the server sent on this page that were dropped while decoding.
    #[serde(skip)]
    pub skipped: u64,
}

impl<T> PageResponse<T> {
    /// Create a response holding every item on a single page.
    pub fn complete(items: Vec<T>) -> Self {
        let total = items.len() as u64;
        Self {
            page: 1,
            page_size: total.max(1),
            total: Some(total),
            items,
            unread_count: None,
            skipped: 0,
        }
    }

    /// Number of items the server sent, including skipped ones.
    pub fn received(&self) -> u64 {
        self.items.len() as u64 + self.skipped
    }

    /// Whether more pages follow this one.
    ///
    /// Without a total, a full page is assumed to have a successor.
    pub fn has_next(&self) -> bool {
        match self.total {
            Some(total) => self.page.saturating_mul(self.page_size) < total,
            None => self.received() >= self.page_size,
        }
    }

    /// Whether this response is the entire collection.
    ///
    /// Only a complete listing may be used to infer deletions.
    pub fn is_complete(&self) -> bool {
        self.page <= 1
            && !self.has_next()
            && self.total.is_none_or(|total| self.received() >= total)
    }

    /// Convert every item, dropping those `f` rejects. Dropped items are
    /// counted in [`skipped`](Self::skipped).
    pub fn filter_map_items<U>(self, mut f: impl FnMut(T) -> Option<U>) -> PageResponse<U> {
        let received = self.items.len() as u64;
        let items: Vec<U> = self.items.into_iter().filter_map(&mut f).collect();
        PageResponse {
            skipped: self.skipped + received - items.len() as u64,
            items,
            page: self.page,
            page_size: self.page_size,
            total: self.total,
            unread_count: self.unread_count,
        }
    }
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}
