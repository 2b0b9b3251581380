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

//! Request executor that replays canned responses for testing purposes.

use crate::{Exec, FetchError, FetchResult, RawResponse};
use async_trait::async_trait;
use bytes::Bytes;
use futures::lock::Mutex;
use reqwest::{Request, StatusCode};
use std::collections::VecDeque;

/// Request executor that returns canned responses in the order in which they were added.
#[derive(Default)]
pub struct MockExec {
    /// Responses to return, consumed from the front.
    responses: Mutex<VecDeque<FetchResult<RawResponse>>>,

    /// URLs of the requests received so far.
    requested_urls: Mutex<Vec<String>>,
}

impl MockExec {
    /// Queues a response with `status` and a raw `body`.
    pub fn with_body<B: Into<Bytes>>(self, status: StatusCode, body: B) -> Self {
        self.with_result(Ok(RawResponse { status, body: body.into() }))
    }

    /// Queues a response with `status` and a `body` serialized as JSON.
    pub fn with_json(self, status: StatusCode, body: serde_json::Value) -> Self {
        self.with_body(status, body.to_string())
    }

    /// Queues a failure to execute the request.
    pub fn with_error(self, error: FetchError) -> Self {
        self.with_result(Err(error))
    }

    /// Queues an arbitrary `result`.
    fn with_result(mut self, result: FetchResult<RawResponse>) -> Self {
        self.responses.get_mut().push_back(result);
        self
    }

    /// Returns the URLs of the requests received so far.
    pub async fn requested_urls(&self) -> Vec<String> {
        self.requested_urls.lock().await.clone()
    }
}

#[async_trait]
impl Exec for MockExec {
    async fn exec(&self, request: Request) -> FetchResult<RawResponse> {
        self.requested_urls.lock().await.push(request.url().to_string());
        match self.responses.lock().await.pop_front() {
            Some(result) => result,
            None => panic!("No more canned responses for {}", request.url()),
        }
    }
}
