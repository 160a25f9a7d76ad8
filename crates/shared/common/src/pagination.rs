//! Page request and page result types.

use serde::{Deserialize, Serialize};
use validator::Validate;

use domain::{DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Pagination query parameters (1-based page number)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, max = 1000000, message = "page number must be between 1 and 1000000"))]
    pub page_number: u64,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100, message = "page size must be between 1 and 100"))]
    pub page_size: u64,
}

fn default_page() -> u64 {
    DEFAULT_PAGE_NUMBER
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl PageRequest {
    pub fn new(page_number: u64, page_size: u64) -> Self {
        Self {
            page_number,
            page_size,
        }
    }

    /// Page size capped at the maximum
    pub fn limit(&self) -> u64 {
        self.page_size.min(MAX_PAGE_SIZE)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: DEFAULT_PAGE_NUMBER,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus the size of the whole result set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: u64,
    pub page_size: u64,
    pub total_count: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page_number: u64, page_size: u64, total_count: u64) -> Self {
        Self {
            items,
            page_number,
            page_size,
            total_count,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.page_size > 0 {
            self.total_count.div_ceil(self.page_size)
        } else {
            0
        }
    }
}
