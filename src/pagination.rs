use serde::Serialize;

/// Reciters shown per page on the public grid.
pub const READERS_PER_PAGE: i64 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    /// Builds the page window for `total` items. Out-of-range pages are
    /// clamped to `[1, max(total_pages, 1)]`.
    pub fn new(total: i64, per_page: i64, requested: Option<i64>) -> Self {
        let per_page = per_page.max(1);
        let total = total.max(0);
        let total_pages = (total + per_page - 1) / per_page;
        let page = requested.unwrap_or(1).clamp(1, total_pages.max(1));
        Pagination {
            page,
            per_page,
            total,
            total_pages,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// The current page taken from an already-loaded list.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.offset() as usize).min(items.len());
        let end = (start + self.per_page as usize).min(items.len());
        &items[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(Pagination::new(0, 6, None).total_pages, 0);
        assert_eq!(Pagination::new(6, 6, None).total_pages, 1);
        assert_eq!(Pagination::new(7, 6, None).total_pages, 2);
        assert_eq!(Pagination::new(13, 6, None).total_pages, 3);
    }

    #[test]
    fn first_and_last_page_windows() {
        let items: Vec<i64> = (0..13).collect();

        let first = Pagination::new(13, 6, Some(1));
        assert_eq!(first.offset(), 0);
        assert_eq!(first.slice(&items), &[0, 1, 2, 3, 4, 5]);
        assert!(!first.has_prev());
        assert!(first.has_next());

        let last = Pagination::new(13, 6, Some(3));
        assert_eq!(last.slice(&items), &[12]);
        assert!(last.has_prev());
        assert!(!last.has_next());
    }

    #[test]
    fn requested_page_is_clamped() {
        assert_eq!(Pagination::new(13, 6, Some(99)).page, 3);
        assert_eq!(Pagination::new(13, 6, Some(-4)).page, 1);
        assert_eq!(Pagination::new(0, 6, Some(5)).page, 1);
        assert!(Pagination::new(0, 6, None).slice::<i64>(&[]).is_empty());
    }
}
