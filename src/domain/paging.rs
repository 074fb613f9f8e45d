pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// 1-based page request, clamped to sane bounds on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page_number: i64,
    pub page_size: i64,
}

impl PageParams {
    pub fn new(page_number: i64, page_size: i64) -> Self {
        Self {
            page_number: page_number.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows to skip. Saturates so an absurd page number reads as a page past
    /// the end instead of overflowing.
    pub fn offset(&self) -> i64 {
        (self.page_number - 1).saturating_mul(self.page_size)
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub current_page: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
}

impl<T> Paged<T> {
    pub fn new(items: Vec<T>, params: PageParams, total_count: i64) -> Self {
        let total_pages = (total_count + params.page_size - 1) / params.page_size;
        Self {
            items,
            current_page: params.page_number,
            page_size: params.page_size,
            total_count,
            total_pages,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            current_page: self.current_page,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_are_clamped() {
        let params = PageParams::new(0, 1000);
        assert_eq!(params.page_number, 1);
        assert_eq!(params.page_size, MAX_PAGE_SIZE);

        let params = PageParams::new(-3, 0);
        assert_eq!(params, PageParams::new(1, 1));
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(PageParams::new(1, 20).offset(), 0);
        assert_eq!(PageParams::new(3, 10).offset(), 20);
    }

    #[test]
    fn huge_page_number_saturates_offset() {
        let params = PageParams::new(i64::MAX, DEFAULT_PAGE_SIZE);
        assert_eq!(params.offset(), i64::MAX);

        let page: Paged<i32> = Paged::new(vec![], params, 5);
        assert!(page.has_previous());
        assert!(!page.has_next());
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Paged::new(vec![1, 2, 3], PageParams::new(1, 3), 7);
        assert_eq!(page.total_pages, 3);
        assert!(!page.has_previous());
        assert!(page.has_next());
    }

    #[test]
    fn last_page_has_no_next() {
        let page = Paged::new(vec![7], PageParams::new(3, 3), 7);
        assert!(page.has_previous());
        assert!(!page.has_next());
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let page: Paged<i32> = Paged::new(vec![], PageParams::default(), 0);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next());
    }

    #[test]
    fn map_keeps_metadata() {
        let page = Paged::new(vec![1, 2], PageParams::new(2, 2), 4).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.total_count, 4);
    }
}
