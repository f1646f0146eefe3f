//! Pagination types shared by every listing

use serde::{Deserialize, Serialize};

/// Pagination parameters.
///
/// Page numbers are 1-based. Page `0` stands for any requested page below 1
/// and always produces an empty page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    pub page: u32,
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page,
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Build parameters from a raw `?page=` value.
    ///
    /// A missing or unparsable value means page 1; values below 1 select the
    /// empty page.
    pub fn from_query(raw: Option<&str>, per_page: u32) -> Self {
        let page = match raw.map(str::trim).map(str::parse::<i64>) {
            Some(Ok(n)) if n < 1 => 0,
            Some(Ok(n)) => u32::try_from(n).unwrap_or(u32::MAX),
            _ => 1,
        };
        Self::new(page, per_page)
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.per_page as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        if self.page == 0 {
            0
        } else {
            self.per_page as i64
        }
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        let per_page = params.per_page.max(1) as i64;
        let total_pages = ((total.max(0) + per_page - 1) / per_page) as u32;
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
            total_pages,
            has_next: params.page < total_pages,
            has_prev: params.page > 1,
        }
    }

    /// Transform the items while keeping the page metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_prev: self.has_prev,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query_defaults_and_invalid() {
        assert_eq!(ListParams::from_query(None, 10).page, 1);
        assert_eq!(ListParams::from_query(Some("abc"), 10).page, 1);
        assert_eq!(ListParams::from_query(Some(""), 10).page, 1);
        assert_eq!(ListParams::from_query(Some("3"), 10).page, 3);
    }

    #[test]
    fn test_page_below_one_is_empty() {
        for raw in ["0", "-1", "-999"] {
            let params = ListParams::from_query(Some(raw), 10);
            assert_eq!(params.page, 0);
            assert_eq!(params.limit(), 0);
        }
    }

    #[test]
    fn test_offset_and_limit() {
        let params = ListParams::new(3, 10);
        assert_eq!(params.offset(), 20);
        assert_eq!(params.limit(), 10);

        let params = ListParams::new(1, 500);
        assert_eq!(params.per_page, 100);
    }

    #[test]
    fn test_paged_result_navigation() {
        let result = PagedResult::new(vec![1, 2, 3], 25, &ListParams::new(2, 10));
        assert_eq!(result.total_pages, 3);
        assert!(result.has_next);
        assert!(result.has_prev);

        let last = PagedResult::new(vec![1], 21, &ListParams::new(3, 10));
        assert!(!last.has_next);

        let empty = PagedResult::<i32>::new(vec![], 0, &ListParams::new(1, 10));
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
        assert!(!empty.has_prev);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let result = PagedResult::new(vec![1, 2], 12, &ListParams::new(2, 10)).map(|n| n * 10);
        assert_eq!(result.items, vec![10, 20]);
        assert_eq!(result.total, 12);
        assert_eq!(result.page, 2);
    }
}
