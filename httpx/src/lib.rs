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

//! HTTP client and helpers to turn JSON responses from other services into lookup tables.
//!
//! The typical flow is to build a `reqwest::Request` with an `HttpClient`, hand it to one of the
//! `execute_and_*` functions along with the path to a JSON array within the response body, and
//! get back a map keyed by one of the fields of the array elements.  Every step of the flow that
//! can fail has its own `FetchError` variant and no partial results are ever returned.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use svckit_core::rest::RestError;

mod client;
pub use client::{HttpClient, HttpClientOptions, REQUEST_ID_HEADER, redact_headers};
mod exec;
pub use exec::{Exec, RawResponse, status_allowed};
mod extract;
pub use extract::{
    execute_and_decode_at, execute_and_map_by_field, execute_and_map_by_field_at,
    execute_and_map_by_key_at,
};
pub mod json;
use json::PathError;
#[cfg(any(test, feature = "testutils"))]
mod mock;
#[cfg(any(test, feature = "testutils"))]
pub use mock::MockExec;

/// Errors raised while fetching and extracting data from another service.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum FetchError {
    /// The response had a status code that the caller did not expect.
    #[error("bad status {status} {reason}")]
    BadStatus {
        /// Numeric status code of the response.
        status: u16,

        /// Canonical reason phrase of the status code.
        reason: String,
    },

    /// The response body, or a node within it, could not be decoded.
    #[error("{0}")]
    Decode(String),

    /// The request could not be built because of an invalid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The path to the interesting node did not match the shape of the response.
    #[error(transparent)]
    Path(#[from] PathError),

    /// The request could not be sent or its response could not be received.
    #[error("{0}")]
    Transport(String),
}

/// Result type for this crate.
pub type FetchResult<T> = Result<T, FetchError>;

impl From<FetchError> for RestError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::BadStatus { .. } | FetchError::Decode(_) | FetchError::Path(_) => {
                RestError::BadGateway(e.to_string())
            }
            FetchError::InvalidUrl(_) | FetchError::Transport(_) => {
                RestError::InternalError(e.to_string())
            }
        }
    }
}
