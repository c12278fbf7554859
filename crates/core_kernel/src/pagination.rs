//! Page requests and paged results for list queries

use serde::{Deserialize, Serialize};

/// A 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    /// Clamps `page` to at least 1 and `limit` to `1..=MAX_LIMIT`
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Rows to skip before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_LIMIT)
    }
}

/// One page of results plus the total across all pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: Page, total: u64) -> Self {
        Self {
            items,
            page: page.page,
            limit: page.limit,
            total,
        }
    }

    /// Pages the slice in memory; used by the in-memory adapters
    pub fn from_all(all: Vec<T>, page: Page) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.limit as usize)
            .collect();
        Self::new(items, page, total)
    }

    /// Number of pages needed for `total` rows
    pub fn pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.limit.max(1)))
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_is_clamped() {
        assert_eq!(Page::new(0, 0), Page { page: 1, limit: 1 });
        assert_eq!(Page::new(3, 500).limit, Page::MAX_LIMIT);
        assert_eq!(Page::new(3, 10).offset(), 20);
    }

    #[test]
    fn test_in_memory_paging() {
        let result = Paginated::from_all((1..=25).collect::<Vec<_>>(), Page::new(3, 10));
        assert_eq!(result.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(result.total, 25);
        assert_eq!(result.pages(), 3);

        let past_end = Paginated::from_all(vec![1, 2], Page::new(5, 10));
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.pages(), 1);
    }
}
