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

//! Pipelines that execute a request and extract data from its JSON response.
//!
//! All pipelines follow the same steps: execute the request, check the status code against the
//! `expected` list (any 2xx if empty), decode the body as JSON and locate the node at the given
//! path.  Each step fails with its own `FetchError` variant.

use crate::json;
use crate::{Exec, FetchError, FetchResult};
use reqwest::Request;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Path to the array of results in the responses of most services.
const DEFAULT_PATH: &[&str] = &["data"];

/// Executes `request` with `exec`, checks its status and decodes its body as JSON.
async fn fetch_json<E>(exec: &E, request: Request, expected: &[u16]) -> FetchResult<Value>
where
    E: Exec + ?Sized,
{
    let response = exec.exec(request).await?;
    response.check_status(expected)?;
    serde_json::from_slice(&response.body)
        .map_err(|e| FetchError::Decode(format!("unmarshal body: {}", e)))
}

/// Executes `request` and indexes the array at path `at` within the response by the `key_field`
/// of its elements.
///
/// Elements that are not objects or that lack `key_field` are skipped.  Keys that are not strings
/// are converted to their JSON representation.  If more than one element has the same key, the
/// last one wins.
pub async fn execute_and_map_by_field_at<E, S>(
    exec: &E,
    request: Request,
    at: &[S],
    key_field: &str,
    expected: &[u16],
) -> FetchResult<HashMap<String, Map<String, Value>>>
where
    E: Exec + ?Sized,
    S: AsRef<str>,
{
    let root = fetch_json(exec, request, expected).await?;
    Ok(json::index_by_field_at(&root, at, key_field)?)
}

/// Same as `execute_and_map_by_field_at` but converts each element with `value_fn`.  Elements for
/// which the conversion fails are skipped.
pub async fn execute_and_map_by_key_at<E, S, T, VE, F>(
    exec: &E,
    request: Request,
    at: &[S],
    key_field: &str,
    value_fn: F,
    expected: &[u16],
) -> FetchResult<HashMap<String, T>>
where
    E: Exec + ?Sized,
    S: AsRef<str>,
    VE: fmt::Display,
    F: FnMut(&Map<String, Value>) -> Result<T, VE>,
{
    let root = fetch_json(exec, request, expected).await?;
    Ok(json::index_by_key_at(&root, at, key_field, value_fn)?)
}

/// Executes `request` and decodes the node at path `at` within the response as a `T`.
pub async fn execute_and_decode_at<E, S, T>(
    exec: &E,
    request: Request,
    at: &[S],
    expected: &[u16],
) -> FetchResult<T>
where
    E: Exec + ?Sized,
    S: AsRef<str>,
    T: DeserializeOwned,
{
    let root = fetch_json(exec, request, expected).await?;
    let node = json::take_at(root, at)?;
    serde_json::from_value(node).map_err(|e| {
        let path = at.iter().map(|s| s.as_ref()).collect::<Vec<&str>>();
        FetchError::Decode(format!("decode node at {:?}: {}", path, e))
    })
}

/// Same as `execute_and_map_by_field_at` with the array at `data` and with any 2xx status.
pub async fn execute_and_map_by_field<E>(
    exec: &E,
    request: Request,
    key_field: &str,
) -> FetchResult<HashMap<String, Map<String, Value>>>
where
    E: Exec + ?Sized,
{
    execute_and_map_by_field_at(exec, request, DEFAULT_PATH, key_field, &[]).await
}
