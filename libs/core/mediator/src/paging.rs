use core_config::paging::PagingConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One page of a list query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: usize,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total_count: usize, page: u32, page_size: u32) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            u32::try_from(total_count.div_ceil(page_size as usize)).unwrap_or(u32::MAX)
        };

        Self {
            items,
            page,
            page_size,
            total_count,
            total_pages,
        }
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }
}

/// Requested page, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Clamp to the configured bounds.
    ///
    /// Page 0 becomes page 1, a page size of 0 becomes the default and a page
    /// size above the maximum becomes the maximum.
    pub fn normalize(self, config: &PagingConfig) -> Self {
        let page = self.page.max(1);
        let page_size = match self.page_size {
            0 => config.default_page_size,
            size if size > config.max_page_size => config.max_page_size,
            size => size,
        };

        if page != self.page || page_size != self.page_size {
            debug!(
                requested_page = self.page,
                requested_page_size = self.page_size,
                page,
                page_size,
                "Normalized page request"
            );
        }

        Self { page, page_size }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        let page = PaginatedResponse::new(vec!["a", "b"], 5, 1, 2);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next_page());
        assert!(!page.has_previous_page());
    }

    #[test]
    fn test_empty_result_has_no_pages() {
        let page = PaginatedResponse::<u8>::new(Vec::new(), 0, 1, 25);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next_page());
    }

    #[test]
    fn test_zero_page_size_yields_zero_pages() {
        let page = PaginatedResponse::<u8>::new(Vec::new(), 10, 1, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_normalize_applies_bounds() {
        let config = PagingConfig::new(25, 100);

        assert_eq!(PageRequest::new(0, 0).normalize(&config), PageRequest::new(1, 25));
        assert_eq!(PageRequest::new(3, 500).normalize(&config), PageRequest::new(3, 100));
        assert_eq!(PageRequest::new(2, 10).normalize(&config), PageRequest::new(2, 10));
    }

    #[test]
    fn test_serialises_camel_case() {
        let page = PaginatedResponse::new(vec![1], 1, 1, 10);
        let value = serde_json::to_value(page).unwrap();
        assert_eq!(value["pageSize"], 10);
        assert_eq!(value["totalCount"], 1);
        assert_eq!(value["totalPages"], 1);
    }
}
