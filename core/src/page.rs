// svckit
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Pagination arithmetic.
//!
//! A page is described by a `limit`/`offset` window.  The `PageInfo` for that window can be
//! computed in two modes:
//!
//! *   Total-known mode, when the caller ran a separate count query and knows how many rows
//!     exist in total.
//! *   Lookahead mode, when the caller fetched `limit + 1` rows instead to learn whether there is
//!     a next page without counting.  The extra probe row must be removed with `trim_lookahead`
//!     before returning the rows to the client.
//!
//! Raw inputs come from clients and are signed: negative values are clamped instead of rejected.

use serde::{Deserialize, Serialize};

/// Limit to use when the client does not provide a valid one.
pub const DEFAULT_LIMIT: u64 = 10;

/// Smallest limit accepted by the page-based constructors.
pub const MIN_LIMIT: u64 = 1;

/// Largest limit accepted by the page-based constructors.
pub const MAX_LIMIT: u64 = 200;

/// Converts a raw signed value to an unsigned one, clamping negative values to zero.
fn clamp_non_neg(x: i64) -> u64 {
    u64::try_from(x).unwrap_or(0)
}

/// Computes `a / b` rounding up.  `b` must not be zero.
fn ceil_div(a: u64, b: u64) -> u64 {
    a / b + u64::from(a % b != 0)
}

/// Clamps a raw `limit` to `[MIN_LIMIT, MAX_LIMIT]`.  Values below the minimum yield
/// `DEFAULT_LIMIT` instead of the minimum.
pub fn clamp_limit(limit: i64) -> u64 {
    match clamp_non_neg(limit) {
        limit if limit < MIN_LIMIT => DEFAULT_LIMIT,
        limit if limit > MAX_LIMIT => MAX_LIMIT,
        limit => limit,
    }
}

/// Computes the offset of the first row of the 1-based `page` given a page size of `limit`.
pub fn page_to_offset(page: i64, limit: i64) -> u64 {
    if limit <= 0 || page <= 1 {
        return 0;
    }
    clamp_non_neg(page - 1).saturating_mul(clamp_non_neg(limit))
}

/// Clamps a raw `limit`/`offset` pair to non-negative values.  A zero limit is left as is.
pub fn clamp_window(limit: i64, offset: i64) -> (u64, u64) {
    (clamp_non_neg(limit), clamp_non_neg(offset))
}

/// Pagination details of a page of results.
///
/// The serialized field names are part of the wire format of list responses.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Maximum number of rows in the page.  Always positive once computed.
    pub limit: u64,

    /// Number of rows skipped before the page.
    pub offset: u64,

    /// Total number of rows, or zero if unknown.
    pub total: u64,

    /// Number of pages.  Always at least 1, and exactly 1 when the total is unknown.
    pub total_pages: u64,

    /// The 1-based number of this page.
    pub current_page: u64,

    /// Whether there are rows after this page.
    pub has_next: bool,

    /// Whether there are rows before this page.
    pub has_previous: bool,
}

impl PageInfo {
    /// Computes the page info for a `limit`/`offset` window over `total` rows.
    ///
    /// A non-positive `limit` becomes `DEFAULT_LIMIT`.  The current page is clamped to the last
    /// page so that an offset past the end still yields a valid page number.
    pub fn from_total(limit: i64, offset: i64, total: i64) -> Self {
        let (limit, offset) = clamp_window(limit, offset);
        let mut pi = Self { limit, offset, total: clamp_non_neg(total), ..Default::default() };
        pi.compute();
        pi
    }

    /// Computes the page info for a `limit`/`offset` window for which the caller fetched
    /// `fetched` rows, expecting at most `limit + 1`.
    ///
    /// The total is unknown so `total` is left at zero and `total_pages` at 1.
    pub fn from_lookahead(limit: i64, offset: i64, fetched: usize) -> Self {
        let (limit, offset) = clamp_window(limit, offset);
        let limit = if limit == 0 { DEFAULT_LIMIT } else { limit };
        Self {
            limit,
            offset,
            total: 0,
            total_pages: 1,
            current_page: (offset / limit).saturating_add(1),
            has_next: u64::try_from(fetched).unwrap_or(u64::MAX) > limit,
            has_previous: offset > 0,
        }
    }

    /// Same as `from_total` but for the 1-based `page` of size `limit`.  The `limit` is clamped
    /// with `clamp_limit`.
    pub fn from_page_limit_total(page: i64, limit: i64, total: i64) -> Self {
        let (limit, offset) = page_window(page, limit);
        Self::from_total(limit, offset, total)
    }

    /// Same as `from_lookahead` but for the 1-based `page` of size `limit`.  The `limit` is
    /// clamped with `clamp_limit`.
    pub fn from_page_limit_lookahead(page: i64, limit: i64, fetched: usize) -> Self {
        let (limit, offset) = page_window(page, limit);
        Self::from_lookahead(limit, offset, fetched)
    }

    /// Recomputes the derived fields from `limit`, `offset` and `total`.
    pub fn compute(&mut self) {
        if self.limit == 0 {
            self.limit = DEFAULT_LIMIT;
        }
        self.has_previous = self.offset > 0;

        if self.total == 0 {
            self.total_pages = 1;
            self.current_page = 1;
            self.has_next = false;
            return;
        }

        self.total_pages = ceil_div(self.total, self.limit);
        self.current_page =
            (self.offset / self.limit).saturating_add(1).clamp(1, self.total_pages);
        self.has_next = self.offset.saturating_add(self.limit) < self.total;
    }
}

/// Converts a raw `page`/`limit` pair into a signed `limit`/`offset` window, clamping the limit.
fn page_window(page: i64, limit: i64) -> (i64, i64) {
    let limit = i64::try_from(clamp_limit(limit)).unwrap_or(i64::MAX);
    let offset = i64::try_from(page_to_offset(page, limit)).unwrap_or(i64::MAX);
    (limit, offset)
}

/// Strips the lookahead probe row from `rows`, which were fetched with a `limit + 1` window.
///
/// Returns the rows truncated to `limit` and whether truncation happened, which means that there
/// is a next page.  A non-positive `limit` leaves the rows untouched.
pub fn trim_lookahead<T>(mut rows: Vec<T>, limit: i64) -> (Vec<T>, bool) {
    let Ok(limit) = usize::try_from(limit) else {
        return (rows, false);
    };
    if limit == 0 || rows.len() <= limit {
        return (rows, false);
    }
    rows.truncate(limit);
    (rows, true)
}

/// Returns a copy of the in-memory page of `rows` starting at `offset` with at most `limit`
/// elements.  The `limit` is clamped with `clamp_limit`.
///
/// Returns an empty vector if `offset` is past the end of `rows`.
pub fn slice_page<T: Clone>(rows: &[T], offset: i64, limit: i64) -> Vec<T> {
    let offset = usize::try_from(clamp_non_neg(offset)).unwrap_or(usize::MAX);
    let limit = usize::try_from(clamp_limit(limit)).unwrap_or(usize::MAX);
    if offset >= rows.len() {
        return vec![];
    }
    let end = offset.saturating_add(limit).min(rows.len());
    rows[offset..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{Token, assert_tokens};

    #[test]
    fn test_clamp_limit() {
        assert_eq!(DEFAULT_LIMIT, clamp_limit(MIN_LIMIT as i64 - 1));
        assert_eq!(DEFAULT_LIMIT, clamp_limit(0));
        assert_eq!(DEFAULT_LIMIT, clamp_limit(-50));
        assert_eq!(MIN_LIMIT, clamp_limit(MIN_LIMIT as i64));
        assert_eq!(25, clamp_limit(25));
        assert_eq!(MAX_LIMIT, clamp_limit(MAX_LIMIT as i64));
        assert_eq!(MAX_LIMIT, clamp_limit(MAX_LIMIT as i64 + 1));
    }

    #[test]
    fn test_page_to_offset() {
        assert_eq!(0, page_to_offset(1, 10));
        assert_eq!(10, page_to_offset(2, 10));
        assert_eq!(40, page_to_offset(5, 10));
        assert_eq!(0, page_to_offset(3, 0));
        assert_eq!(0, page_to_offset(0, 10));
        assert_eq!(0, page_to_offset(-4, 10));
        assert_eq!(u64::MAX, page_to_offset(i64::MAX, i64::MAX));
    }

    #[test]
    fn test_clamp_window() {
        assert_eq!((0, 0), clamp_window(-5, -10));
        assert_eq!((10, 20), clamp_window(10, 20));
    }

    #[test]
    fn test_from_total_empty_dataset() {
        let pi = PageInfo::from_total(10, 0, 0);
        assert_eq!(
            PageInfo {
                limit: 10,
                offset: 0,
                total: 0,
                total_pages: 1,
                current_page: 1,
                has_next: false,
                has_previous: false,
            },
            pi
        );
    }

    #[test]
    fn test_from_total_negative_total_is_empty() {
        let pi = PageInfo::from_total(10, 30, -7);
        assert_eq!(0, pi.total);
        assert_eq!(1, pi.total_pages);
        assert_eq!(1, pi.current_page);
        assert!(!pi.has_next);
        assert!(pi.has_previous);
    }

    #[test]
    fn test_from_total_middle_page() {
        let pi = PageInfo::from_total(10, 20, 95);
        assert_eq!(10, pi.total_pages);
        assert_eq!(3, pi.current_page);
        assert!(pi.has_previous);
        assert!(pi.has_next);
    }

    #[test]
    fn test_from_total_last_page() {
        let pi = PageInfo::from_total(10, 30, 35);
        assert_eq!(4, pi.total_pages);
        assert_eq!(4, pi.current_page);
        assert!(pi.has_previous);
        assert!(!pi.has_next);
    }

    #[test]
    fn test_from_total_exact_multiple() {
        let pi = PageInfo::from_total(10, 10, 20);
        assert_eq!(2, pi.total_pages);
        assert_eq!(2, pi.current_page);
        assert!(!pi.has_next);
    }

    #[test]
    fn test_from_total_offset_past_end_clamps_current_page() {
        let pi = PageInfo::from_total(10, 1000, 50);
        assert_eq!(5, pi.total_pages);
        assert_eq!(5, pi.current_page);
        assert!(!pi.has_next);
        assert!(pi.has_previous);
    }

    #[test]
    fn test_from_total_defaults_and_clamps_inputs() {
        let pi = PageInfo::from_total(0, 0, 25);
        assert_eq!(DEFAULT_LIMIT, pi.limit);
        assert_eq!(3, pi.total_pages);

        let pi = PageInfo::from_total(-3, -8, 25);
        assert_eq!(DEFAULT_LIMIT, pi.limit);
        assert_eq!(0, pi.offset);
        assert!(!pi.has_previous);
        assert_eq!(1, pi.current_page);
    }

    #[test]
    fn test_from_total_unaligned_offset() {
        let pi = PageInfo::from_total(10, 15, 100);
        assert_eq!(2, pi.current_page);
        assert!(pi.has_previous);
        assert!(pi.has_next);
    }

    #[test]
    fn test_from_lookahead() {
        let pi = PageInfo::from_lookahead(10, 20, 11);
        assert_eq!(
            PageInfo {
                limit: 10,
                offset: 20,
                total: 0,
                total_pages: 1,
                current_page: 3,
                has_next: true,
                has_previous: true,
            },
            pi
        );

        let pi = PageInfo::from_lookahead(10, 0, 10);
        assert!(!pi.has_next);
        assert!(!pi.has_previous);
        assert_eq!(1, pi.current_page);
    }

    #[test]
    fn test_from_lookahead_defaults_limit() {
        let pi = PageInfo::from_lookahead(0, 0, 1);
        assert_eq!(DEFAULT_LIMIT, pi.limit);
        assert!(!pi.has_next);

        let pi = PageInfo::from_lookahead(-1, -1, 11);
        assert_eq!(DEFAULT_LIMIT, pi.limit);
        assert_eq!(0, pi.offset);
        assert!(pi.has_next);
    }

    #[test]
    fn test_compute() {
        let mut pi = PageInfo { limit: 0, offset: 5, total: 0, ..Default::default() };
        pi.compute();
        assert_eq!(DEFAULT_LIMIT, pi.limit);
        assert_eq!(1, pi.total_pages);
        assert_eq!(1, pi.current_page);
        assert!(pi.has_previous);
        assert!(!pi.has_next);

        let mut pi = PageInfo { limit: 10, offset: 10, total: 5, ..Default::default() };
        pi.compute();
        assert_eq!(1, pi.total_pages);
        assert_eq!(1, pi.current_page);
    }

    #[test]
    fn test_from_page_limit_total() {
        let pi = PageInfo::from_page_limit_total(3, 10, 95);
        assert_eq!(20, pi.offset);
        assert_eq!(3, pi.current_page);
        assert_eq!(10, pi.total_pages);

        let pi = PageInfo::from_page_limit_total(1, MAX_LIMIT as i64 + 999, 5);
        assert_eq!(MAX_LIMIT, pi.limit);

        let pi = PageInfo::from_page_limit_total(0, 0, 5);
        assert_eq!(DEFAULT_LIMIT, pi.limit);
        assert_eq!(0, pi.offset);
    }

    #[test]
    fn test_from_page_limit_lookahead() {
        let pi = PageInfo::from_page_limit_lookahead(2, 10, 15);
        assert_eq!(10, pi.offset);
        assert_eq!(2, pi.current_page);
        assert!(pi.has_next);
        assert!(pi.has_previous);
    }

    #[test]
    fn test_page_info_invariants() {
        for limit in [-1, 0, 1, 3, 10] {
            for offset in [-5, 0, 1, 9, 10, 11, 99, 1000] {
                for total in [-1, 0, 1, 10, 11, 100] {
                    let pi = PageInfo::from_total(limit, offset, total);
                    assert!(pi.limit > 0);
                    assert!(pi.total_pages >= 1);
                    assert!(pi.current_page >= 1 && pi.current_page <= pi.total_pages);
                    assert_eq!(pi.offset > 0, pi.has_previous);
                    assert_eq!(pi.offset + pi.limit < pi.total, pi.has_next);
                }
            }
        }
    }

    #[test]
    fn test_page_info_ser_de() {
        let pi = PageInfo {
            limit: 7,
            offset: 14,
            total: 100,
            total_pages: 15,
            current_page: 3,
            has_next: true,
            has_previous: true,
        };
        assert_tokens(
            &pi,
            &[
                Token::Struct { name: "PageInfo", len: 7 },
                Token::Str("limit"),
                Token::U64(7),
                Token::Str("offset"),
                Token::U64(14),
                Token::Str("total"),
                Token::U64(100),
                Token::Str("totalPages"),
                Token::U64(15),
                Token::Str("currentPage"),
                Token::U64(3),
                Token::Str("hasNext"),
                Token::Bool(true),
                Token::Str("hasPrevious"),
                Token::Bool(true),
                Token::StructEnd,
            ],
        );
    }

    #[test]
    fn test_trim_lookahead() {
        let (rows, has_next) = trim_lookahead(vec![1, 2, 3, 4], 3);
        assert!(has_next);
        assert_eq!(vec![1, 2, 3], rows);

        let (rows, has_next) = trim_lookahead(vec![1, 2, 3, 4], 5);
        assert!(!has_next);
        assert_eq!(vec![1, 2, 3, 4], rows);

        let (rows, has_next) = trim_lookahead(vec![1, 2, 3], 3);
        assert!(!has_next);
        assert_eq!(3, rows.len());

        let (rows, has_next) = trim_lookahead(vec![1, 2], 0);
        assert!(!has_next);
        assert_eq!(2, rows.len());

        let (rows, has_next) = trim_lookahead(vec![1, 2], -1);
        assert!(!has_next);
        assert_eq!(2, rows.len());
    }

    #[test]
    fn test_lookahead_flow() {
        let rows: Vec<u32> = (0..11).collect();
        let pi = PageInfo::from_lookahead(10, 20, rows.len());
        let (rows, has_next) = trim_lookahead(rows, 10);
        assert_eq!(10, rows.len());
        assert!(has_next);
        assert_eq!(pi.has_next, has_next);
        assert_eq!(3, pi.current_page);
    }

    #[test]
    fn test_slice_page() {
        let rows = vec![1, 2, 3, 4, 5];
        assert_eq!(vec![2, 3], slice_page(&rows, 1, 2));
        assert_eq!(vec![4, 5], slice_page(&rows, 3, 10));
        assert!(slice_page(&rows, 5, 2).is_empty());
        assert!(slice_page(&rows, 10, 2).is_empty());
        assert_eq!(vec![1, 2], slice_page(&rows, -3, 2));
        assert_eq!(rows, slice_page(&rows, 0, 0));
    }

    #[test]
    fn test_slice_page_is_a_copy() {
        let rows = vec![1, 2, 3, 4, 5];
        for offset in 0..5 {
            for limit in 1..6 {
                let mut page = slice_page(&rows, offset, limit);
                for value in page.iter_mut() {
                    *value = 999;
                }
                assert_eq!(vec![1, 2, 3, 4, 5], rows);
            }
        }
    }
}
