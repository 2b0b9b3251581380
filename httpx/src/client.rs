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

//! HTTP client with retries and request logging.

use crate::{Exec, FetchError, FetchResult, RawResponse};
use async_trait::async_trait;
use derivative::Derivative;
use log::{Level, debug, log, warn};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, Request, RequestBuilder, StatusCode};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use svckit_core::env::get_optional_var;
use url::Url;

/// Name of the header used to propagate request identifiers to other services.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Default maximum amount of time a request can take, including reading the response body.
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3200);

/// Default number of times to retry a failed request.
const DEFAULT_RETRIES: u32 = 1;

/// Default amount of time to wait between retries.
const DEFAULT_RETRY_WAIT: Duration = Duration::from_millis(200);

/// Names of the headers whose values must never be logged, in lowercase.
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "x-api-key",
    "api-key",
    "x-auth-token",
    "proxy-authorization",
    "set-cookie",
    "cookie",
];

/// Replacement value for sensitive headers.
const REDACTED: &str = "***REDACTED***";

/// Options to configure an `HttpClient`.
#[derive(Derivative)]
#[derivative(Debug)]
#[cfg_attr(test, derivative(PartialEq))]
pub struct HttpClientOptions {
    /// Base URL against which relative request paths are resolved.
    pub base_url: Option<Url>,

    /// Maximum amount of time a request can take.  Zero means the default.
    pub timeout: Duration,

    /// Number of times to retry a request that failed with a transport error or a 5xx status.
    pub retries: u32,

    /// Amount of time to wait between retries.
    pub retry_wait: Duration,

    /// Whether to log outgoing requests in detail.
    pub debug: bool,
}

impl Default for HttpClientOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            retry_wait: DEFAULT_RETRY_WAIT,
            debug: false,
        }
    }
}

impl HttpClientOptions {
    /// Creates a set of options from environment variables whose name is prefixed with the given
    /// `prefix`.
    ///
    /// This will use variables such as `<prefix>_BASE_URL`, `<prefix>_TIMEOUT`,
    /// `<prefix>_RETRIES`, `<prefix>_RETRY_WAIT` and `<prefix>_DEBUG`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        Ok(Self {
            base_url: get_optional_var::<Url>(prefix, "BASE_URL")?,
            timeout: get_optional_var::<Duration>(prefix, "TIMEOUT")?.unwrap_or(DEFAULT_TIMEOUT),
            retries: get_optional_var::<u32>(prefix, "RETRIES")?.unwrap_or(DEFAULT_RETRIES),
            retry_wait: get_optional_var::<Duration>(prefix, "RETRY_WAIT")?
                .unwrap_or(DEFAULT_RETRY_WAIT),
            debug: get_optional_var::<bool>(prefix, "DEBUG")?.unwrap_or(false),
        })
    }
}

/// Renders `headers` for logging purposes, hiding the values of sensitive headers.
///
/// Headers with more than one value have their values joined by commas.
pub fn redact_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for name in headers.keys() {
        let value = if SENSITIVE_HEADERS.contains(&name.as_str()) {
            REDACTED.to_owned()
        } else {
            headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<String>>()
                .join(",")
        };
        out.insert(name.as_str().to_owned(), value);
    }
    out
}

/// Picks the log level for a response with `status`.
fn level_for(status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::Error
    } else if status.is_client_error() {
        Level::Warn
    } else {
        Level::Info
    }
}

/// HTTP client to talk to other services.
///
/// Cloning the client is cheap and all clones share the same connection pool.
#[derive(Clone, Debug)]
pub struct HttpClient {
    /// Underlying HTTP client.
    client: Client,

    /// Base URL against which relative request paths are resolved.
    base_url: Option<Url>,

    /// Number of times to retry a failed request.
    retries: u32,

    /// Amount of time to wait between retries.
    retry_wait: Duration,

    /// Whether to log outgoing requests in detail.
    debug: bool,

    /// Identifier of the incoming request on whose behalf this client issues requests.
    request_id: Option<String>,
}

impl HttpClient {
    /// Creates a new client using `opts` for configuration.
    pub fn new(opts: HttpClientOptions) -> FetchResult<Self> {
        let timeout = if opts.timeout.is_zero() { DEFAULT_TIMEOUT } else { opts.timeout };
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("Cannot create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: opts.base_url,
            retries: opts.retries,
            retry_wait: opts.retry_wait,
            debug: opts.debug,
            request_id: None,
        })
    }

    /// Returns a copy of this client that tags all requests with the `request_id`.  An empty
    /// `request_id` disables tagging.
    pub fn with_request_id<S: Into<String>>(&self, request_id: S) -> Self {
        let request_id = request_id.into();
        let mut client = self.clone();
        client.request_id = if request_id.is_empty() { None } else { Some(request_id) };
        client
    }

    /// Returns the request identifier attached to this client, if any.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Resolves `path` against the base URL, or parses it as an absolute URL if there is no
    /// base URL.
    pub fn url(&self, path: &str) -> FetchResult<Url> {
        let url = match &self.base_url {
            Some(base) => base.join(path),
            None => Url::parse(path),
        };
        url.map_err(|e| FetchError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// Starts building a request with `method` for `path`.
    pub fn request(&self, method: Method, path: &str) -> FetchResult<RequestBuilder> {
        Ok(self.client.request(method, self.url(path)?))
    }

    /// Starts building a GET request for `path`.
    pub fn get(&self, path: &str) -> FetchResult<RequestBuilder> {
        self.request(Method::GET, path)
    }

    /// Returns a suffix to append to log lines to identify the request, if possible.
    fn request_id_suffix(&self) -> String {
        match &self.request_id {
            Some(id) => format!(" [request_id={}]", id),
            None => String::new(),
        }
    }

    /// Sends `request` once and reads the whole response.
    async fn exec_once(&self, request: Request) -> Result<RawResponse, reqwest::Error> {
        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok(RawResponse { status, body })
    }
}

#[async_trait]
impl Exec for HttpClient {
    async fn exec(&self, mut request: Request) -> FetchResult<RawResponse> {
        if let Some(id) = &self.request_id {
            match HeaderValue::from_str(id) {
                Ok(value) => {
                    request.headers_mut().insert(REQUEST_ID_HEADER, value);
                }
                Err(e) => warn!("Not propagating invalid request id {}: {}", id, e),
            }
        }

        let mut attempt = 1;
        loop {
            // Requests with streaming bodies cannot be cloned and thus cannot be retried.
            let retry = if attempt <= self.retries { request.try_clone() } else { None };

            let method = request.method().clone();
            let url = request.url().clone();
            if self.debug {
                debug!(
                    "HTTP {} {} attempt {} headers={:?}{}",
                    method,
                    url,
                    attempt,
                    redact_headers(request.headers()),
                    self.request_id_suffix()
                );
            }

            let start = Instant::now();
            match self.exec_once(request).await {
                Ok(response) => {
                    log!(
                        level_for(response.status),
                        "HTTP {} {} -> {} in {}ms ({} bytes, attempt {}){}",
                        method,
                        url,
                        response.status.as_u16(),
                        start.elapsed().as_millis(),
                        response.body.len(),
                        attempt,
                        self.request_id_suffix()
                    );
                    match retry {
                        Some(next) if response.status.is_server_error() => request = next,
                        _ => return Ok(response),
                    }
                }
                Err(e) => {
                    log!(
                        Level::Error,
                        "HTTP {} {} failed in {}ms (attempt {}): {}{}",
                        method,
                        url,
                        start.elapsed().as_millis(),
                        attempt,
                        e,
                        self.request_id_suffix()
                    );
                    match retry {
                        Some(next) if !e.is_timeout() => request = next,
                        _ => return Err(FetchError::Transport(e.to_string())),
                    }
                }
            }

            attempt += 1;
            tokio::time::sleep(self.retry_wait).await;
        }
    }
}
