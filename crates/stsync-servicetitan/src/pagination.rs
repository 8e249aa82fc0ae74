//! Page-number pagination stop rules.
//!
//! List endpoints take `page` (1-based) and `pageSize` and answer with a
//! [`crate::types::PageEnvelope`]. A fetch loop keeps going only while pages
//! come back full and the server has not said otherwise.

/// Why a paged fetch stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStop {
    /// The page had no rows.
    Empty,
    /// The page had fewer rows than requested.
    Partial,
    /// The server reported `hasMore: false`.
    NoMore,
    /// The endpoint answered 404 for this page.
    NotFound,
    /// The configured page cap was reached while more pages may exist.
    PageLimit,
}

/// Decides whether the page just received was the last one.
///
/// Returns `None` when another page should be requested. The page cap is
/// checked by the caller, which knows the page number.
#[must_use]
pub fn stop_after_page(rows: usize, page_size: u32, has_more: Option<bool>) -> Option<PageStop> {
    if rows == 0 {
        return Some(PageStop::Empty);
    }
    if rows < page_size as usize {
        return Some(PageStop::Partial);
    }
    if has_more == Some(false) {
        return Some(PageStop::NoMore);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_page_stops() {
        assert_eq!(stop_after_page(0, 100, Some(true)), Some(PageStop::Empty));
    }

    #[test]
    fn partial_page_stops_even_if_server_says_more() {
        assert_eq!(stop_after_page(42, 100, Some(true)), Some(PageStop::Partial));
    }

    #[test]
    fn full_page_with_no_more_stops() {
        assert_eq!(stop_after_page(100, 100, Some(false)), Some(PageStop::NoMore));
    }

    #[test]
    fn full_page_continues() {
        assert_eq!(stop_after_page(100, 100, Some(true)), None);
        assert_eq!(stop_after_page(100, 100, None), None);
    }
}
