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

//! Parsing of sort expressions.
//!
//! Two conventions are supported and they are intentionally kept apart:
//!
//! *   The suffix convention, `email:desc,name:asc,id`, handled by `parse`.
//! *   The prefix convention, `-created_at,name`, handled by `parse_prefixed` and
//!     `order_by_prefixed`.
//!
//! Mixing both conventions in the same expression is not supported: a field name that starts with
//! a dash would be ambiguous.

use crate::fields::{AliasMap, FieldSet, normalize};
use serde::{Deserialize, Serialize};

/// Direction tokens that select a descending order in the suffix convention.
const DESCENDING_TOKENS: &[&str] = &["desc", "d", "descending"];

/// A single sort criterion.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SortField {
    /// Name of the field to sort by, as given by the client.  Not validated.
    pub field: String,

    /// Whether the order is descending.
    pub descending: bool,
}

impl SortField {
    /// Creates an ascending sort criterion on `field`.
    pub fn asc<S: Into<String>>(field: S) -> Self {
        Self { field: field.into(), descending: false }
    }

    /// Creates a descending sort criterion on `field`.
    pub fn desc<S: Into<String>>(field: S) -> Self {
        Self { field: field.into(), descending: true }
    }

    /// Returns the SQL keyword for the direction of this criterion.
    pub fn direction(&self) -> &'static str {
        if self.descending { "DESC" } else { "ASC" }
    }

    /// Formats an `ORDER BY` token for `column` using the direction of this criterion.
    fn order_by(&self, column: &str) -> String {
        format!("{} {}", column, self.direction())
    }
}

/// Parses a sort expression written in the suffix convention.
///
/// The expression is a comma-separated list of `field[:direction]` items.  Empty items and items
/// with an empty field are skipped.  The direction is case-insensitive and anything other than
/// `desc`, `d` or `descending` means ascending.  Duplicate fields are preserved.
pub fn parse(raw: &str) -> Vec<SortField> {
    let raw = raw.trim();
    if raw.is_empty() {
        return vec![];
    }

    let mut out = vec![];
    for item in raw.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }

        let sort = match item.split_once(':') {
            Some((field, direction)) => {
                let direction = direction.trim().to_lowercase();
                SortField {
                    field: field.trim().to_owned(),
                    descending: DESCENDING_TOKENS.contains(&direction.as_str()),
                }
            }
            None => SortField::asc(item),
        };
        if !sort.field.is_empty() {
            out.push(sort);
        }
    }
    out
}

/// Parses a sort expression written in the prefix convention.
///
/// The expression is a comma-separated list of fields where a leading `-` selects a descending
/// order.  Only one dash is stripped and the remainder is taken verbatim.
pub fn parse_prefixed(raw: &str) -> Vec<SortField> {
    let mut out = vec![];
    for item in raw.split(',') {
        let item = item.trim();
        let sort = match item.strip_prefix('-') {
            Some(field) => SortField::desc(field),
            None => SortField::asc(item),
        };
        if !sort.field.is_empty() {
            out.push(sort);
        }
    }
    out
}

/// Turns a prefix-convention expression into `ORDER BY` tokens like `name ASC`.
///
/// Fields are matched verbatim against `allowed` and unknown ones are dropped.  Returns
/// `[default]` if the expression is empty or if nothing survives the filtering.
pub fn order_by_prefixed(raw: &str, allowed: &FieldSet, default: &str) -> Vec<String> {
    let out: Vec<String> = parse_prefixed(raw)
        .into_iter()
        .filter(|sort| allowed.contains(&sort.field))
        .map(|sort| sort.order_by(&sort.field))
        .collect();
    if out.is_empty() { vec![default.to_owned()] } else { out }
}

/// Turns parsed sort criteria into `ORDER BY` tokens by resolving their fields through `alias`.
///
/// Fields are normalized before the lookup and those without a column are dropped.  Returns a
/// copy of `defaults` if `items` is empty or if nothing survives the filtering.
pub fn build_order_expr<D: AsRef<str>>(
    items: &[SortField],
    alias: &AliasMap,
    defaults: &[D],
) -> Vec<String> {
    let out: Vec<String> = items
        .iter()
        .filter_map(|sort| match alias.resolve(&normalize(&sort.field)) {
            Some(column) if !column.is_empty() => Some(sort.order_by(column)),
            _ => None,
        })
        .collect();
    if out.is_empty() { defaults.iter().map(|d| d.as_ref().to_owned()).collect() } else { out }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        assert!(parse("").is_empty());
        assert!(parse("   \t").is_empty());
        assert!(parse(",, ,").is_empty());
    }

    #[test]
    fn test_parse_suffix_convention() {
        assert_eq!(
            vec![SortField::desc("email"), SortField::asc("name"), SortField::asc("id")],
            parse("email:desc,name:asc,id")
        );
    }

    #[test]
    fn test_parse_skips_malformed() {
        assert_eq!(vec![SortField::desc("valid")], parse(":desc,,valid:desc"));
        assert_eq!(vec![SortField::asc("a")], parse("  :  , a , : "));
    }

    #[test]
    fn test_parse_direction_aliases() {
        assert_eq!(
            vec![
                SortField::desc("a"),
                SortField::desc("b"),
                SortField::desc("c"),
                SortField::asc("d"),
                SortField::asc("e"),
                SortField::asc("f"),
            ],
            parse("a:DESC, b : d ,c:Descending,d:down,e:,f:asc")
        );
    }

    #[test]
    fn test_parse_splits_on_first_colon_only() {
        assert_eq!(vec![SortField::asc("a")], parse("a:desc:extra"));
        assert_eq!(vec![SortField::desc("a")], parse("a: desc "));
    }

    #[test]
    fn test_parse_keeps_order_and_duplicates() {
        assert_eq!(
            vec![SortField::asc("Name"), SortField::desc("id"), SortField::desc("Name")],
            parse(" Name ,id:d,Name:desc")
        );
    }

    #[test]
    fn test_parse_prefixed() {
        assert_eq!(
            vec![SortField::desc("created_at"), SortField::asc("name"), SortField::desc("-x")],
            parse_prefixed("-created_at, name,,-,--x")
        );
        assert!(parse_prefixed("").is_empty());
    }

    #[test]
    fn test_order_by_prefixed() {
        let allowed = FieldSet::new(["name", "created_at"]);
        assert_eq!(
            vec!["created_at DESC", "name ASC"],
            order_by_prefixed("-created_at,password,name", &allowed, "id ASC")
        );
    }

    #[test]
    fn test_order_by_prefixed_defaults() {
        let allowed = FieldSet::new(["name"]);
        assert_eq!(vec!["id ASC"], order_by_prefixed("", &allowed, "id ASC"));
        assert_eq!(vec!["id ASC"], order_by_prefixed("-password,nope", &allowed, "id ASC"));
        assert_eq!(vec!["id ASC"], order_by_prefixed("NAME", &allowed, "id ASC"));
    }

    #[test]
    fn test_build_order_expr() {
        let alias = AliasMap::new([("name", "full_name"), ("createdAt", "created_at")]);
        let items = parse("Name:desc,unknown,createdat");
        assert_eq!(
            vec!["full_name DESC", "created_at ASC"],
            build_order_expr(&items, &alias, &["id DESC"])
        );
    }

    #[test]
    fn test_build_order_expr_defaults() {
        let alias = AliasMap::new([("name", "full_name"), ("ghost", "")]);
        let defaults = ["id DESC", "name ASC"];
        assert_eq!(defaults.to_vec(), build_order_expr(&[], &alias, &defaults));
        assert_eq!(
            defaults.to_vec(),
            build_order_expr(&[SortField::asc("ghost"), SortField::asc("x")], &alias, &defaults)
        );

        let none: [&str; 0] = [];
        assert!(build_order_expr(&[SortField::asc("x")], &alias, &none).is_empty());
    }
}
