use serde::Serialize;

pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    // `page < 1` becomes 1, `per_page < 1` falls back to the default,
    // anything above the cap is clamped.
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        let page = match page {
            Some(p) if p >= 1 => p.min(u32::MAX as i64) as u32,
            _ => 1,
        };
        let per_page = match per_page {
            Some(n) if n >= 1 => n.min(MAX_PER_PAGE as i64) as u32,
            _ => DEFAULT_PER_PAGE,
        };
        Self { page, per_page }
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.per_page as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(request: PageRequest, total: u64) -> Self {
        let pages = total.div_ceil(request.per_page as u64);
        Self {
            page: request.page,
            per_page: request.per_page,
            total,
            pages,
            has_next: (request.page as u64) < pages,
            has_prev: request.page > 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}
