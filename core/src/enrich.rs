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

//! Best-effort concurrent enrichment of responses.
//!
//! Handlers often decorate their primary results with data fetched from other services (names of
//! the referenced users, thumbnails, etc.).  These lookups are independent from each other and
//! none of them is critical: if one fails or is too slow, the response is still returned without
//! the extra data.  `EnrichBatch` runs such lookups concurrently, each one bounded by its own
//! deadline, and waits until all of them are done or cut off.
//!
//! Tasks communicate their results by writing to state they borrow from the caller.

use crate::env::get_optional_var;
use derivative::Derivative;
use futures::future::{self, BoxFuture, FutureExt};
use log::{debug, warn};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Default maximum amount of time each task can run for.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Options to configure an `EnrichBatch`.
#[derive(Derivative)]
#[derivative(Debug)]
#[cfg_attr(test, derivative(PartialEq))]
pub struct EnrichOptions {
    /// Maximum amount of time each task can run for.
    pub timeout: Duration,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self { timeout: DEFAULT_TIMEOUT }
    }
}

impl EnrichOptions {
    /// Creates a set of options from environment variables whose name is prefixed with the given
    /// `prefix`.
    ///
    /// This will use variables such as `<prefix>_TIMEOUT`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        Ok(Self {
            timeout: get_optional_var::<Duration>(prefix, "TIMEOUT")?.unwrap_or(DEFAULT_TIMEOUT),
        })
    }
}

/// A named unit of work within a batch.
struct Task<'a> {
    /// Name of the task for logging purposes.
    name: String,

    /// The work to do.
    fut: BoxFuture<'a, Result<(), String>>,
}

/// Collection of independent tasks to run concurrently.
#[must_use]
pub struct EnrichBatch<'a> {
    /// Maximum amount of time each task can run for.
    timeout: Duration,

    /// Deadline imposed by the caller, if any.  Takes precedence over `timeout` if earlier.
    deadline: Option<Instant>,

    /// Tasks to run.
    tasks: Vec<Task<'a>>,
}

impl<'a> EnrichBatch<'a> {
    /// Creates a new empty batch configured with `opts`.
    pub fn new(opts: EnrichOptions) -> Self {
        Self { timeout: opts.timeout, deadline: None, tasks: vec![] }
    }

    /// Bounds all tasks by the caller's `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Adds a task called `name` to the batch.
    pub fn task<N, F>(mut self, name: N, fut: F) -> Self
    where
        N: Into<String>,
        F: Future<Output = Result<(), String>> + Send + 'a,
    {
        self.tasks.push(Task { name: name.into(), fut: fut.boxed() });
        self
    }

    /// Returns the number of tasks in the batch.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if the batch has no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Runs all tasks concurrently and waits until every one of them has finished or has been
    /// cut off by its deadline.
    ///
    /// Failures are logged and never affect the other tasks.
    pub async fn run(self) {
        // A timeout too large to be represented is the same as no timeout at all.
        let deadline = match (Instant::now().checked_add(self.timeout), self.deadline) {
            (Some(own), Some(parent)) => Some(own.min(parent)),
            (own, parent) => own.or(parent),
        };

        debug!("Running {} enrichment tasks", self.tasks.len());
        let runs = self.tasks.into_iter().map(|task| async move {
            let result = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, task.fut)
                    .await
                    .unwrap_or_else(|_| Err("deadline exceeded".to_owned())),
                None => task.fut.await,
            };
            if let Err(e) = result {
                warn!("Enrichment task {} failed: {}", task.name, e);
            }
        });
        future::join_all(runs).await;
    }
}
