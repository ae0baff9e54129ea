//! Page/limit handling for list endpoints.

use serde::Serialize;
use utoipa::ToSchema;

/// Page size used when the client does not ask for one.
pub const DEFAULT_LIMIT: u64 = 10;
/// Largest page a client may request.
pub const MAX_LIMIT: u64 = 100;
/// Highest page number accepted; keeps `page * limit` within an `i64` offset.
pub const MAX_PAGE: u64 = i64::MAX.unsigned_abs() / MAX_LIMIT;

/// A validated, 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u64,
    /// Items per page, `1..=MAX_LIMIT`
    pub limit: u64,
}

impl PageRequest {
    /// Clamps raw query values: page to `1..=MAX_PAGE`, limit to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    /// Zero-based page index, as `SeaORM` paginators expect.
    #[must_use]
    pub const fn index(&self) -> u64 {
        self.page - 1
    }

    /// Builds response metadata for `total` matching items.
    #[must_use]
    pub const fn meta(&self, total: u64) -> PageMeta {
        PageMeta {
            total,
            page: self.page,
            limit: self.limit,
            total_pages: total.div_ceil(self.limit),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination metadata included in every list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Number of items matching the filter, across all pages
    pub total: u64,
    /// Current 1-based page
    pub page: u64,
    /// Page size
    pub limit: u64,
    /// `ceil(total / limit)`
    pub total_pages: u64,
}
