//! Common value types.

use serde::{Deserialize, Serialize};

/// Hard cap on page size for any listing endpoint.
pub const MAX_PAGE_SIZE: u32 = 100;

const DEFAULT_PAGE_SIZE: u32 = 10;

/// Paginated result envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total matching items before pagination.
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    /// Slices an already filtered and sorted result set. Page numbers
    /// are 1-based; `page` 0 means the first page and `page_size` 0
    /// means the default, with the size clamped to [`MAX_PAGE_SIZE`].
    pub fn slice(items: Vec<T>, page: u32, page_size: u32) -> Self {
        let page = page.max(1);
        let page_size = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size.min(MAX_PAGE_SIZE)
        };
        let total = items.len() as u64;
        let start = (page as usize - 1).saturating_mul(page_size as usize);
        let items = items
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();
        Self {
            items,
            total,
            page,
            page_size,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(self.page_size as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_clamps_and_counts() {
        let page = Page::slice((0..25).collect::<Vec<_>>(), 2, 10);
        assert_eq!(page.total, 25);
        assert_eq!(page.items, (10..20).collect::<Vec<_>>());
        assert_eq!(page.total_pages(), 3);

        let capped = Page::slice(vec![1], 0, 1_000);
        assert_eq!(capped.page, 1);
        assert_eq!(capped.page_size, MAX_PAGE_SIZE);

        let defaulted = Page::slice(Vec::<i32>::new(), 1, 0);
        assert_eq!(defaulted.page_size, 10);
    }

    #[test]
    fn slice_past_end_is_empty() {
        let page = Page::slice(vec![1, 2, 3], 5, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
    }
}
