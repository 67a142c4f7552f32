//! Fixed-size pages over an ordered result set.
//!
//! Requests for a page outside `1..=num_pages` never fail: they are clamped to the
//! nearest valid page. An empty result set still has one (empty) page.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Page
///
/// One slice of a result set plus the metadata a listing needs for navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub per_page: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

/// PageWindow
///
/// The resolved position of a page inside a result set of known size. The store
/// uses `offset`/`limit` to fetch only the rows of that page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub per_page: u64,
}

impl PageWindow {
    pub fn offset(&self) -> i64 {
        to_i64((self.number - 1) * self.per_page)
    }

    pub fn limit(&self) -> i64 {
        to_i64(self.per_page)
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
            per_page: self.per_page,
            has_next: self.has_next(),
            has_previous: self.has_previous(),
        }
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Paginator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: u64,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Paginator {
    /// A page size of zero is treated as one.
    pub fn new(per_page: u64) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    pub fn num_pages(&self, total: u64) -> u64 {
        if total == 0 {
            1
        } else {
            total.div_ceil(self.per_page)
        }
    }

    /// Resolves a requested 1-based page number against `total` rows.
    pub fn window(&self, total: u64, requested: i64) -> PageWindow {
        let num_pages = self.num_pages(total);
        let number = match u64::try_from(requested) {
            Ok(n) => n.clamp(1, num_pages),
            Err(_) => 1,
        };
        PageWindow {
            number,
            num_pages,
            total,
            per_page: self.per_page,
        }
    }

    /// Slices an in-memory sequence.
    pub fn paginate<T>(&self, items: Vec<T>, requested: i64) -> Page<T> {
        let window = self.window(items.len() as u64, requested);
        let start = usize::try_from((window.number - 1) * self.per_page).unwrap_or(usize::MAX);
        let len = usize::try_from(self.per_page).unwrap_or(usize::MAX);
        let slice = items.into_iter().skip(start).take(len).collect();
        window.into_page(slice)
    }
}

/// Reads the `?page=` query value. Anything that is not an integer means page one.
pub fn parse_page_number(raw: Option<&str>) -> i64 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: u32) -> Vec<u32> {
        (1..=n).collect()
    }

    #[test]
    fn first_page_has_next_but_no_previous() {
        let page = Paginator::new(10).paginate(numbers(25), 1);
        assert_eq!(page.items, numbers(10));
        assert_eq!(page.num_pages, 3);
        assert_eq!(page.total, 25);
        assert!(page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn last_page_holds_the_remainder() {
        let page = Paginator::new(10).paginate(numbers(25), 3);
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert!(!page.has_next);
        assert!(page.has_previous);
    }

    #[test]
    fn page_beyond_the_end_clamps_to_last() {
        let page = Paginator::new(10).paginate(numbers(25), 99);
        assert_eq!(page.number, 3);
        assert_eq!(page.items.len(), 5);
    }

    #[test]
    fn zero_and_negative_pages_clamp_to_first() {
        let paginator = Paginator::new(10);
        assert_eq!(paginator.window(25, 0).number, 1);
        assert_eq!(paginator.window(25, -4).number, 1);
    }

    #[test]
    fn empty_sequence_has_one_empty_page() {
        let page = Paginator::new(10).paginate(Vec::<u32>::new(), 5);
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(page.items.is_empty());
        assert!(!page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn exact_multiple_does_not_add_a_page() {
        assert_eq!(Paginator::new(10).num_pages(30), 3);
        assert_eq!(Paginator::new(10).num_pages(31), 4);
    }

    #[test]
    fn window_offsets_match_page_number() {
        let window = Paginator::new(10).window(95, 4);
        assert_eq!(window.offset(), 30);
        assert_eq!(window.limit(), 10);
    }

    #[test]
    fn zero_page_size_is_treated_as_one() {
        assert_eq!(Paginator::new(0).per_page(), 1);
    }

    #[test]
    fn page_parameter_parsing() {
        assert_eq!(parse_page_number(None), 1);
        assert_eq!(parse_page_number(Some("3")), 3);
        assert_eq!(parse_page_number(Some(" 2 ")), 2);
        assert_eq!(parse_page_number(Some("last")), 1);
        assert_eq!(parse_page_number(Some("-1")), -1);
    }
}
