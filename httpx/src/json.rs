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

//! Navigation of untyped JSON documents and indexing of JSON arrays.
//!
//! A path is a sequence of object keys.  The empty path designates the root of the document.

use log::debug;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;

/// Errors raised when a JSON document does not have the shape the caller expected.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum PathError {
    /// A segment of the path was reached on a node that is not an object.
    #[error("path {path:?} not found or invalid: segment '{segment}' is not an object")]
    NotAnObject {
        /// The full path being navigated.
        path: Vec<String>,

        /// The segment that could not be looked up.
        segment: String,
    },

    /// A segment of the path does not exist in its parent object.
    #[error("path {path:?} not found or invalid: segment '{segment}' not found")]
    NotFound {
        /// The full path being navigated.
        path: Vec<String>,

        /// The segment that does not exist.
        segment: String,
    },

    /// The node at the path exists but it is not an array.
    #[error("node at {path:?} is not an array")]
    NotAnArray {
        /// The full path to the node.
        path: Vec<String>,
    },
}

/// Result type for this module.
pub type PathResult<T> = Result<T, PathError>;

/// Converts a borrowed `path` into an owned one for error reporting.
fn owned_path<S: AsRef<str>>(path: &[S]) -> Vec<String> {
    path.iter().map(|s| s.as_ref().to_owned()).collect()
}

/// Walks `root` through the object keys in `path` and returns the node at the end.
pub fn locate<'v, S: AsRef<str>>(root: &'v Value, path: &[S]) -> PathResult<&'v Value> {
    let mut current = root;
    for segment in path {
        let segment = segment.as_ref();
        current = match current {
            Value::Object(map) => map.get(segment).ok_or_else(|| PathError::NotFound {
                path: owned_path(path),
                segment: segment.to_owned(),
            })?,
            _ => {
                return Err(PathError::NotAnObject {
                    path: owned_path(path),
                    segment: segment.to_owned(),
                });
            }
        };
    }
    Ok(current)
}

/// Same as `locate` but only reports whether the node exists.
pub fn find_at<'v, S: AsRef<str>>(root: &'v Value, path: &[S]) -> Option<&'v Value> {
    locate(root, path).ok()
}

/// Same as `locate` but consumes `root` and returns the node at the end of `path` without
/// copying it.
pub fn take_at<S: AsRef<str>>(root: Value, path: &[S]) -> PathResult<Value> {
    let mut current = root;
    for segment in path {
        let segment = segment.as_ref();
        current = match current {
            Value::Object(mut map) => map.remove(segment).ok_or_else(|| PathError::NotFound {
                path: owned_path(path),
                segment: segment.to_owned(),
            })?,
            _ => {
                return Err(PathError::NotAnObject {
                    path: owned_path(path),
                    segment: segment.to_owned(),
                });
            }
        };
    }
    Ok(current)
}

/// Converts a JSON scalar into a map key.  Strings are used as is and any other value is
/// formatted as its compact JSON representation.
///
/// Numbers without a fractional part are always formatted as integers, even if they were written
/// as `123.0` or `1e2`, so that keys do not depend on how the upstream service encodes them.
pub fn key_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 => {
                if f >= i64::MIN as f64 && f < i64::MAX as f64 {
                    (f as i64).to_string()
                } else if f >= 0.0 && f < u64::MAX as f64 {
                    (f as u64).to_string()
                } else {
                    n.to_string()
                }
            }
            _ => n.to_string(),
        },
        value => value.to_string(),
    }
}

/// Indexes the array at `path` within `root` by the `key_field` of its elements, converting
/// each element with `value_fn`.
///
/// Elements that are not objects, that lack `key_field` or for which `value_fn` fails are
/// skipped.  If more than one element has the same key, the last one wins.
pub fn index_by_key_at<S, T, E, F>(
    root: &Value,
    path: &[S],
    key_field: &str,
    mut value_fn: F,
) -> PathResult<HashMap<String, T>>
where
    S: AsRef<str>,
    E: fmt::Display,
    F: FnMut(&Map<String, Value>) -> Result<T, E>,
{
    let array = match locate(root, path)? {
        Value::Array(array) => array,
        _ => return Err(PathError::NotAnArray { path: owned_path(path) }),
    };

    let mut out = HashMap::with_capacity(array.len());
    for element in array {
        let Value::Object(object) = element else {
            continue;
        };
        let Some(key) = object.get(key_field) else {
            continue;
        };
        let key = key_string(key);
        match value_fn(object) {
            Ok(value) => {
                out.insert(key, value);
            }
            Err(e) => debug!("Skipping element with key {}: {}", key, e),
        }
    }
    Ok(out)
}

/// Indexes the array at `path` within `root` by the `key_field` of its elements.
///
/// This is the same as `index_by_key_at` with a conversion that returns copies of the objects.
pub fn index_by_field_at<S: AsRef<str>>(
    root: &Value,
    path: &[S],
    key_field: &str,
) -> PathResult<HashMap<String, Map<String, Value>>> {
    index_by_key_at(root, path, key_field, |object| Ok::<_, Infallible>(object.clone()))
}

/// Indexes the array `node` by the `key_field` of its elements.
pub fn index_by_field(
    node: &Value,
    key_field: &str,
) -> PathResult<HashMap<String, Map<String, Value>>> {
    index_by_field_at::<&str>(node, &[], key_field)
}
