//! Pagination window and list result types.
//!
//! A list request may carry a half-open window `[start, end)`. The window is considered
//! requested as soon as either bound is present, including `start = 0`. The total count
//! reported alongside a page is always the number of records that survived filtering,
//! before the window was applied.

use serde::{Deserialize, Serialize};
use std::cmp::min;

/// Header carrying the post-filter total of a windowed list.
pub const TOTAL_COUNT_HEADER: &str = "X-Total-Count";

/// Header declaring [`TOTAL_COUNT_HEADER`] readable by cross-origin clients.
pub const EXPOSE_HEADERS_HEADER: &str = "Access-Control-Expose-Headers";

/// A single page of list results.
///
/// # Example
///
/// ```ignore
/// use docrest::page::Page;
///
/// let page: Page<String> = Page::builder(vec!["item1".to_string()])
///     .with_count(100)
///     .with_windowed(true)
///     .build();
///
/// assert_eq!(page.items.len(), 1);
/// assert_eq!(page.count, 100);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The items contained in this page.
    pub items: Vec<T>,
    /// Number of items that matched the filters, before windowing.
    pub count: usize,
    /// Whether a window was requested for this page.
    pub windowed: bool,
}

impl<T> Page<T> {
    /// Creates a new builder for constructing a page with custom settings.
    pub fn builder(items: Vec<T>) -> PageBuilder<T> {
        PageBuilder::new(items)
    }

    /// Response headers to emit with this page.
    ///
    /// Empty unless a window was requested, in which case the total count is exposed.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        if !self.windowed {
            return Vec::new();
        }

        vec![
            (TOTAL_COUNT_HEADER, self.count.to_string()),
            (EXPOSE_HEADERS_HEADER, TOTAL_COUNT_HEADER.to_string()),
        ]
    }

    /// Maps every item of this page, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            count: self.count,
            windowed: self.windowed,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            count: 0,
            windowed: false,
        }
    }
}

/// Builder for constructing [`Page`] instances with fluent API.
pub struct PageBuilder<T> {
    items: Vec<T>,
    count: usize,
    windowed: bool,
}

impl<T> PageBuilder<T> {
    /// Creates a new builder with the given items.
    pub fn new(items: Vec<T>) -> Self {
        let count = items.len();

        Self {
            items,
            count,
            windowed: false,
        }
    }

    /// Sets the post-filter total.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Marks the page as the result of a requested window.
    pub fn with_windowed(mut self, windowed: bool) -> Self {
        self.windowed = windowed;
        self
    }

    /// Builds and returns the final [`Page`] instance.
    pub fn build(self) -> Page<T> {
        Page {
            items: self.items,
            count: self.count,
            windowed: self.windowed,
        }
    }
}

/// Half-open pagination window `[start, end)`.
///
/// Both bounds are optional; a missing start means `0` and a missing end means the end
/// of the sequence.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    /// First index to include.
    pub start: Option<usize>,
    /// First index to exclude.
    pub end: Option<usize>,
}

impl Window {
    /// Creates a window with both bounds.
    pub fn new(start: Option<usize>, end: Option<usize>) -> Self {
        Self { start, end }
    }

    /// Whether any bound was requested.
    pub fn is_requested(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// Slices `items` to this window and wraps them in a [`Page`].
    ///
    /// The page count is the length of `items`. Out-of-range bounds are clamped and an
    /// end before the start yields an empty page.
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let count = items.len();

        if !self.is_requested() {
            return Page::builder(items).build();
        }

        let start = min(self.start.unwrap_or(0), count);
        let end = min(self.end.unwrap_or(count), count).max(start);

        let window = items
            .into_iter()
            .skip(start)
            .take(end - start)
            .collect();

        Page::builder(window)
            .with_count(count)
            .with_windowed(true)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_start_still_applies_the_window() {
        let page = Window::new(Some(0), Some(2)).paginate(vec![1, 2, 3, 4, 5]);

        assert_eq!(page.items, vec![1, 2]);
        assert_eq!(page.count, 5);
        assert!(page.windowed);
    }

    #[test]
    fn end_defaults_to_length() {
        let page = Window::new(Some(3), None).paginate(vec![1, 2, 3, 4, 5]);

        assert_eq!(page.items, vec![4, 5]);
        assert_eq!(page.count, 5);
    }

    #[test]
    fn end_alone_requests_a_window() {
        let page = Window::new(None, Some(1)).paginate(vec![1, 2, 3]);

        assert_eq!(page.items, vec![1]);
        assert!(page.windowed);
    }

    #[test]
    fn out_of_range_bounds_are_clamped() {
        assert!(Window::new(Some(10), None).paginate(vec![1, 2]).items.is_empty());
        assert!(Window::new(Some(2), Some(1)).paginate(vec![1, 2, 3]).items.is_empty());
        assert_eq!(Window::new(Some(1), Some(50)).paginate(vec![1, 2, 3]).items, vec![2, 3]);
    }

    #[test]
    fn unwindowed_pages_carry_no_headers() {
        let page = Window::default().paginate(vec![1, 2, 3]);

        assert!(!page.windowed);
        assert_eq!(page.count, 3);
        assert!(page.headers().is_empty());
    }

    #[test]
    fn windowed_pages_expose_the_total() {
        let page = Window::new(Some(0), Some(1)).paginate(vec!['a', 'b']);

        assert_eq!(
            page.headers(),
            vec![
                ("X-Total-Count", "2".to_string()),
                ("Access-Control-Expose-Headers", "X-Total-Count".to_string()),
            ],
        );
    }
}
