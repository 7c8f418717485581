//! Page arithmetic shared by live trending and storage listings

use std::ops::Range;

use crate::models::SearchResult;

/// Resolve a requested limit: missing or non-positive means `default`,
/// anything above `max` is capped
pub fn clamp_limit(requested: Option<i64>, default: u32, max: u32) -> u32 {
    match requested {
        Some(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX).min(max),
        _ => default.min(max),
    }
    .max(1)
}

/// Resolve a requested page number; anything below 1 is page 1
pub fn clamp_page(requested: Option<i64>) -> u32 {
    match requested {
        Some(n) if n > 1 => u32::try_from(n).unwrap_or(u32::MAX),
        _ => 1,
    }
}

/// Position of one page within `total` items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub total_pages: u32,
    start: usize,
}

impl PageWindow {
    /// `page` and `limit` are expected to be clamped already (both >= 1)
    pub fn new(total: usize, page: u32, limit: u32) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        let per_page = limit as usize;
        let total_pages = u32::try_from(total.div_ceil(per_page)).unwrap_or(u32::MAX);
        let start = (page as usize - 1).saturating_mul(per_page);
        Self {
            page,
            limit,
            total,
            total_pages,
            start,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Page starts past the last item of a non-empty collection
    pub fn is_out_of_range(&self) -> bool {
        self.total > 0 && self.start >= self.total
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.total_pages
    }

    /// Index range of this page; empty when out of range
    pub fn range(&self) -> Range<usize> {
        if self.start >= self.total {
            return 0..0;
        }
        self.start..(self.start + self.limit as usize).min(self.total)
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.range()]
    }

    pub fn out_of_range_message(&self) -> String {
        format!(
            "Page {} exceeds available pages (total: {})",
            self.page, self.total_pages
        )
    }

    /// Result for the cases where there is no page to fill: nothing at all,
    /// or a page past the end. `None` means the page has items.
    pub fn short_circuit(&self, empty_message: &str) -> Option<SearchResult> {
        if self.is_empty() {
            Some(self.stamp(SearchResult::empty(empty_message)))
        } else if self.is_out_of_range() {
            Some(self.stamp(
                SearchResult::failure(self.out_of_range_message()).with_total_found(self.total),
            ))
        } else {
            None
        }
    }

    /// Copy the page metadata onto a result
    pub fn stamp(&self, mut result: SearchResult) -> SearchResult {
        result.page = Some(self.page);
        result.total_pages = Some(self.total_pages);
        result.results_per_page = Some(self.limit);
        result.has_next_page = Some(self.has_next_page());
        result
    }
}
