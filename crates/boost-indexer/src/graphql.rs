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

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use crate::error::FetchError;

#[derive(Serialize)]
struct Request<'a, V> {
    query: &'a str,
    variables: V,
}

#[derive(Deserialize, Debug)]
struct GraphQlErrorMessage {
    message: String,
}

#[derive(Deserialize, Debug)]
struct Response<D> {
    data: Option<D>,
    #[serde(default)]
    errors: Option<Vec<GraphQlErrorMessage>>,
}

/// Minimal GraphQL-over-HTTP client.
#[derive(Clone, Debug)]
pub struct GraphQlClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl GraphQlClient {
    pub fn new(endpoint: Url) -> Self {
        Self { client: reqwest::Client::new(), endpoint }
    }

    /// POST `query` with `variables` and decode the `data` member into `D`.
    pub async fn query<V, D>(&self, query: &str, variables: V) -> Result<D, FetchError>
    where
        V: Serialize,
        D: DeserializeOwned,
    {
        let body = self
            .client
            .post(self.endpoint.clone())
            .json(&Request { query, variables })
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        decode_response(&body)
    }
}

fn decode_response<D: DeserializeOwned>(body: &str) -> Result<D, FetchError> {
    let response: Response<D> = serde_json::from_str(body)?;
    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        let messages: Vec<_> = errors.into_iter().map(|err| err.message).collect();
        return Err(FetchError::GraphQl(messages.join("; ")));
    }
    response.data.ok_or(FetchError::MissingData)
}
