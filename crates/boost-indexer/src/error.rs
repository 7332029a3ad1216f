// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use thiserror::Error;

/// Failure while fetching from an upstream source.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("GraphQL query failed: {0}")]
    GraphQl(String),

    #[error("response did not contain data")]
    MissingData,

    #[error("response did not contain field {0}")]
    MissingField(String),

    #[error("invalid value in response: {0}")]
    InvalidValue(String),
}

/// Result of a paginated fetch.
///
/// Pagination distinguishes a source that was exhausted from one that failed part way through:
/// in the latter case `interruption` holds the error and `records` holds what was collected
/// before it.
#[derive(Debug)]
pub struct FetchOutcome<T> {
    pub records: Vec<T>,
    pub pages: usize,
    pub interruption: Option<FetchError>,
}

impl<T> FetchOutcome<T> {
    pub fn complete(records: Vec<T>, pages: usize) -> Self {
        Self { records, pages, interruption: None }
    }

    pub fn interrupted(records: Vec<T>, pages: usize, error: FetchError) -> Self {
        Self { records, pages, interruption: Some(error) }
    }

    pub fn is_complete(&self) -> bool {
        self.interruption.is_none()
    }

    /// Apply `f` to the collected records, keeping the interruption.
    pub fn map<U>(self, f: impl FnOnce(Vec<T>) -> Vec<U>) -> FetchOutcome<U> {
        FetchOutcome {
            records: f(self.records),
            pages: self.pages,
            interruption: self.interruption,
        }
    }

    /// Append another outcome. The first interruption encountered is kept.
    pub fn merge(mut self, other: FetchOutcome<T>) -> Self {
        self.records.extend(other.records);
        self.pages += other.pages;
        if self.interruption.is_none() {
            self.interruption = other.interruption;
        }
        self
    }

    /// Records if the source was exhausted, or the interruption.
    pub fn into_complete(self) -> Result<Vec<T>, FetchError> {
        match self.interruption {
            None => Ok(self.records),
            Some(err) => Err(err),
        }
    }

    /// Records collected so far, logging any interruption.
    pub fn into_lossy(self, source: &str) -> Vec<T> {
        if let Some(err) = &self.interruption {
            tracing::warn!(
                "Fetching {} stopped after {} pages ({} records): {}",
                source,
                self.pages,
                self.records.len(),
                err
            );
        }
        self.records
    }

    /// Resolve according to the caller's tolerance for partial data.
    pub fn resolve(self, source: &str, allow_partial: bool) -> anyhow::Result<Vec<T>> {
        if allow_partial {
            return Ok(self.into_lossy(source));
        }
        let pages = self.pages;
        self.into_complete().map_err(|err| {
            anyhow::Error::new(err)
                .context(format!("fetching {source} failed after {pages} pages"))
        })
    }
}
