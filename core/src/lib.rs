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

//! Small building blocks shared by backend services.
//!
//! Services that expose list-style REST APIs and that aggregate data from other services tend to
//! reimplement the same handful of helpers over and over again.  This crate collects them:
//!
//! 1.  `query`: Parsing of raw query string values (integers, booleans, CSV lists) that never
//!     fails.  Invalid input falls back to caller-supplied defaults.
//!
//! 1.  `fields`: Allow-listing of the fields (or storage columns) a client may request, with
//!     optional case normalization and aliasing from public names to column names.
//!
//! 1.  `sort`: Parsing of compact sort expressions into `SortField`s and into `ORDER BY`
//!     fragments that only reference allowed columns.
//!
//! 1.  `page`: Pagination arithmetic that turns a limit/offset window plus either a known total
//!     or a lookahead row count into a `PageInfo`.
//!
//! 1.  `rest`: The response envelope and the error type for the HTTP layer.
//!
//! 1.  `enrich`: A best-effort concurrent fan-out of named tasks with per-task deadlines.
//!
//! 1.  `env`: Typed access to configuration in environment variables.
//!
//! The filtering helpers are deliberately fail-open: client input that is unknown or malformed is
//! dropped instead of rejected so that stale clients degrade gracefully.
//!
//! This crate does not have any heavy dependencies.  The HTTP client lives in a sibling crate.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

pub mod enrich;
pub mod env;
pub mod fields;
pub mod page;
pub mod query;
pub mod rest;
pub mod sort;
