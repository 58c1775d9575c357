//! Page arithmetic for offset-paginated listings

/// Row range of a 1-based page as `(from, to)` with `to` inclusive, i.e. the
/// half-open window `[(page - 1) * limit, page * limit)`.
pub fn page_range(page: u32, limit: u32) -> (u64, u64) {
    let page = u64::from(page.max(1));
    let limit = u64::from(limit.max(1));
    let from = (page - 1) * limit;
    (from, from + limit - 1)
}

/// `ceil(total / limit)`, zero for an empty listing
pub fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    let pages = total.div_ceil(u64::from(limit));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Whether pages exist after `page`
pub fn has_more(page: u32, total_pages: u32) -> bool {
    page < total_pages
}
