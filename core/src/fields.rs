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

//! Allow-listing of the fields that a client can request.
//!
//! A client typically passes something like `?fields=id,Name, email` and the service must turn
//! that into a list of storage columns that are safe to interpolate into a query.  The selection
//! is fail-open: anything that is not allowed is silently dropped, and an empty request yields
//! the caller's defaults.

use std::collections::{HashMap, HashSet};

/// Normalizes a raw field name by trimming surrounding whitespace and lower-casing it.
pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Set of field names that a client is allowed to request.
///
/// The set is immutable once built.  An empty set allows nothing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldSet(HashSet<String>);

impl FieldSet {
    /// Builds a set that matches `names` exactly, preserving their case.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Builds a set from `names` after passing each of them through `normalize`.
    pub fn normalized<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(names.into_iter().map(|name| normalize(name.as_ref())).collect())
    }

    /// Returns true if `name` is in the set.  No normalization happens here.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Returns true if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of distinct names in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Mapping of public field names to the storage columns that back them.
///
/// Keys are normalized on insertion so that lookups can be done with normalized input.  When the
/// same key is given more than once, the last definition wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AliasMap(HashMap<String, String>);

impl AliasMap {
    /// Builds an alias map from `(alias, column)` pairs.
    pub fn new<I, A, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, C)>,
        A: AsRef<str>,
        C: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(alias, column)| (normalize(alias.as_ref()), column.into()))
                .collect(),
        )
    }

    /// Returns the column that `alias` maps to.  `alias` must already be normalized.
    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.0.get(alias).map(String::as_str)
    }

    /// Returns the set of all aliases, which is the natural allow-list for this map.
    pub fn allowed(&self) -> FieldSet {
        FieldSet(self.0.keys().cloned().collect())
    }
}

/// How a `FieldSelector` matches requested names against its allow-list.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Matching<'a> {
    /// Requested names are trimmed and must then match the allow-list with the same case.
    Exact,

    /// Requested names are normalized before matching.
    Normalized,

    /// Requested names are normalized, matched and then resolved through an alias map.
    Aliased(&'a AliasMap),
}

/// Filters a client-provided list of fields against an allow-list.
///
/// The output preserves the order in which fields were requested and never contains the same
/// value twice.
#[derive(Clone, Copy, Debug)]
pub struct FieldSelector<'a> {
    /// Names that the client is allowed to request.
    allowed: &'a FieldSet,

    /// How the requested names are matched and mapped.
    matching: Matching<'a>,
}

impl<'a> FieldSelector<'a> {
    /// Creates a selector that requires requested names, once trimmed, to match `allowed` with
    /// the same case.
    pub fn exact(allowed: &'a FieldSet) -> Self {
        Self { allowed, matching: Matching::Exact }
    }

    /// Creates a selector that normalizes requested names before matching them.  `allowed`
    /// should have been built with `FieldSet::normalized`.
    pub fn normalized(allowed: &'a FieldSet) -> Self {
        Self { allowed, matching: Matching::Normalized }
    }

    /// Creates a selector that normalizes requested names, checks them against `allowed` and
    /// emits the column they map to in `alias`.
    ///
    /// A name that is allowed but has no entry in `alias` is dropped.
    pub fn aliased(allowed: &'a FieldSet, alias: &'a AliasMap) -> Self {
        Self { allowed, matching: Matching::Aliased(alias) }
    }

    /// Maps a single requested name to the value to emit, if it is allowed.
    fn map_one(&self, name: &str) -> Option<String> {
        match self.matching {
            Matching::Exact => {
                let name = name.trim();
                self.allowed.contains(name).then(|| name.to_owned())
            }
            Matching::Normalized => {
                let name = normalize(name);
                self.allowed.contains(&name).then_some(name)
            }
            Matching::Aliased(alias) => {
                let name = normalize(name);
                if !self.allowed.contains(&name) {
                    return None;
                }
                alias.resolve(&name).map(str::to_owned)
            }
        }
    }

    /// Computes the fields to use given the client's `selected` list.
    ///
    /// If `selected` is empty, returns `defaults` verbatim.  Otherwise returns the allowed
    /// entries of `selected`, deduplicated by their emitted value.
    pub fn select<S, D>(&self, selected: &[S], defaults: &[D]) -> Vec<String>
    where
        S: AsRef<str>,
        D: AsRef<str>,
    {
        if selected.is_empty() {
            return defaults.iter().map(|d| d.as_ref().to_owned()).collect();
        }

        let mut seen = HashSet::with_capacity(selected.len());
        let mut out = Vec::with_capacity(selected.len());
        for name in selected {
            if let Some(value) = self.map_one(name.as_ref()) {
                if seen.insert(value.clone()) {
                    out.push(value);
                }
            }
        }
        out
    }
}

/// Maps the `requested` public field names to storage columns using `alias` as the allow-list.
///
/// Returns an empty list when nothing was requested.
pub fn safe_columns<S: AsRef<str>>(requested: &[S], alias: &AliasMap) -> Vec<String> {
    let allowed = alias.allowed();
    FieldSelector::aliased(&allowed, alias).select::<S, &str>(requested, &[])
}
