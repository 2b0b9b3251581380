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

//! Lenient parsing of raw query string values.
//!
//! None of the functions in this module fail: malformed input yields the caller-supplied default.

use crate::page::{self, PageInfo};
use crate::sort::{self, SortField};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Parses `s` as a non-negative decimal integer, returning `default` if `s` is empty, invalid or
/// negative.
pub fn int64(s: &str, default: i64) -> i64 {
    match s.trim().parse::<i64>() {
        Ok(n) if n >= 0 => n,
        _ => default,
    }
}

/// Same as `int64` but zero also yields `default`.
pub fn positive_int(s: &str, default: i64) -> i64 {
    match int64(s, 0) {
        0 => default,
        n => n,
    }
}

/// Splits `s` on commas, trimming each part and dropping the empty ones.
pub fn csv(s: &str) -> Vec<String> {
    s.split(',').map(str::trim).filter(|part| !part.is_empty()).map(str::to_owned).collect()
}

/// Parses `s` as a boolean, returning `None` if it is not a known boolean literal.
pub fn bool_opt(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "t" | "true" | "y" | "yes" => Some(true),
        "0" | "f" | "false" | "n" | "no" => Some(false),
        _ => None,
    }
}

/// Parses `s` as a boolean, returning `default` if it is not a known boolean literal.
pub fn bool_or(s: &str, default: bool) -> bool {
    bool_opt(s).unwrap_or(default)
}

/// Drops empty strings and duplicates from `xs`, preserving first-seen order.
pub fn unique_strings<S: AsRef<str>>(xs: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = vec![];
    for x in xs {
        let x = x.as_ref();
        if !x.is_empty() && seen.insert(x) {
            out.push(x.to_owned());
        }
    }
    out
}

/// Returns true if `xs` contains exactly `x`.
pub fn contains_str<S: AsRef<str>>(xs: &[S], x: &str) -> bool {
    xs.iter().any(|candidate| candidate.as_ref() == x)
}

/// The raw parameters accepted by list endpoints.
///
/// All values are kept as strings so that malformed input never causes the request to be
/// rejected during extraction.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ListQuery {
    /// Comma-separated list of fields to return.
    pub fields: Option<String>,

    /// Sort expression in the suffix convention.
    pub sort: Option<String>,

    /// 1-based page number.  Takes precedence over `offset` when present and valid.
    pub page: Option<String>,

    /// Maximum number of rows to return.
    pub limit: Option<String>,

    /// Number of rows to skip.
    pub offset: Option<String>,
}

impl ListQuery {
    /// Returns the requested fields.
    pub fn fields(&self) -> Vec<String> {
        self.fields.as_deref().map(csv).unwrap_or_default()
    }

    /// Returns the requested sort criteria.
    pub fn sort(&self) -> Vec<SortField> {
        self.sort.as_deref().map(sort::parse).unwrap_or_default()
    }

    /// Computes the effective `(limit, offset)` window.
    ///
    /// The limit is always clamped.  If a positive `page` is present, the offset is derived from
    /// it and the raw `offset` is ignored.
    pub fn window(&self) -> (i64, i64) {
        let limit = page::clamp_limit(int64(self.limit.as_deref().unwrap_or(""), 0));
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = match positive_int(self.page.as_deref().unwrap_or(""), 0) {
            0 => int64(self.offset.as_deref().unwrap_or(""), 0),
            page => i64::try_from(page::page_to_offset(page, limit)).unwrap_or(i64::MAX),
        };
        (limit, offset)
    }

    /// Computes the page info for this query's window given the `total` number of rows.
    pub fn page_info(&self, total: i64) -> PageInfo {
        let (limit, offset) = self.window();
        PageInfo::from_total(limit, offset, total)
    }

    /// Computes the page info for this query's window given the number of `fetched` rows from a
    /// lookahead query.
    pub fn page_info_lookahead(&self, fetched: usize) -> PageInfo {
        let (limit, offset) = self.window();
        PageInfo::from_lookahead(limit, offset, fetched)
    }
}
