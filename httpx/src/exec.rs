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

//! Abstraction over the execution of HTTP requests.

use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Request, StatusCode};

/// A fully-received HTTP response.
#[derive(Clone, Debug, PartialEq)]
pub struct RawResponse {
    /// Status code of the response.
    pub status: StatusCode,

    /// Raw body of the response.
    pub body: Bytes,
}

impl RawResponse {
    /// Fails with `FetchError::BadStatus` if the status of the response is not allowed by
    /// `expected`.  See `status_allowed` for details.
    pub fn check_status(&self, expected: &[u16]) -> FetchResult<()> {
        if status_allowed(self.status, expected) {
            Ok(())
        } else {
            Err(FetchError::BadStatus {
                status: self.status.as_u16(),
                reason: self.status.canonical_reason().unwrap_or("Unknown").to_owned(),
            })
        }
    }
}

/// Returns true if `status` is in `expected` or, if `expected` is empty, if `status` is 2xx.
pub fn status_allowed(status: StatusCode, expected: &[u16]) -> bool {
    if expected.is_empty() { status.is_success() } else { expected.contains(&status.as_u16()) }
}

/// Interface to send HTTP requests and collect their responses.
#[async_trait]
pub trait Exec {
    /// Sends `request` and waits for the whole response.
    ///
    /// Responses with any status code are returned as successes.  Only failures to send the
    /// request or to receive the response are errors.
    async fn exec(&self, request: Request) -> FetchResult<RawResponse>;
}
