//! Pagination parameters and derived page metadata.

use serde::{Deserialize, Serialize};

/// Default page size when the caller does not supply one.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Requested page, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u32,
    pub page_size: u32,
}

impl PageParams {
    /// Clamp page to at least 1 and page_size to at least 1.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// WFS startIndex for this page: (page - 1) * pageSize.
    pub fn start_index(&self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Pagination metadata returned alongside a page of features.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u32,
    pub page_size: u32,
    pub total_features: u64,
    pub total_pages: u64,
    pub has_more: bool,
    pub start_index: u64,
    pub end_index: i64,
}

impl PageInfo {
    /// Compute page metadata from the requested page, the total feature
    /// count, and the number of features actually returned.
    ///
    /// `end_index` is inclusive, so an empty page yields `start_index - 1`.
    pub fn compute(params: PageParams, total_features: u64, returned: usize) -> Self {
        let total_pages = total_pages(total_features, params.page_size);
        let start_index = params.start_index();
        Self {
            page: params.page,
            page_size: params.page_size,
            total_features,
            total_pages,
            has_more: (params.page as u64) < total_pages,
            start_index,
            end_index: start_index as i64 + returned as i64 - 1,
        }
    }
}

/// totalPages = max(1, ceil(totalFeatures / pageSize))
pub fn total_pages(total_features: u64, page_size: u32) -> u64 {
    let page_size = page_size.max(1) as u64;
    (total_features.div_ceil(page_size)).max(1)
}
