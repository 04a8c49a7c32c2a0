//! Page-based pagination utilities.

use serde::{Deserialize, Serialize};

/// Default items per page.
pub const DEFAULT_PER_PAGE: u32 = 50;

/// Upper bound on items per page.
pub const MAX_PER_PAGE: u32 = 500;

/// Page request parsed from query parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PageParams {
    /// Clamps page to at least 1 and per_page to `1..=MAX_PER_PAGE`.
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }

    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.per_page as i64
    }
}

/// Pagination metadata returned alongside a page of results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationMeta {
    pub current_page: u32,
    pub per_page: u32,
    pub last_page: u32,
    pub total: i64,
}

impl PaginationMeta {
    pub fn new(params: PageParams, total: i64) -> Self {
        let per_page = params.per_page.max(1) as i64;
        let last_page = if total <= 0 {
            1
        } else {
            ((total + per_page - 1) / per_page) as u32
        };
        Self {
            current_page: params.page,
            per_page: params.per_page,
            last_page,
            total,
        }
    }
}

/// A page of items with its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}
