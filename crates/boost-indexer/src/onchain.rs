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

//! Client for the indexer of boost contract events.

use std::collections::HashMap;

use async_trait::async_trait;
use boost_rewards::{
    normalize_onchain_events, OnchainEvent, OnchainEventKind, RawBoostEvent, TimeWindow,
};
use serde::Serialize;

use crate::{
    config::EndpointConfig,
    error::{FetchError, FetchOutcome},
    graphql::GraphQlClient,
};

/// Source of normalized boost contract events.
#[async_trait]
pub trait OnchainSource: Send + Sync {
    /// Events of every kind whose block timestamp falls inside `window`.
    async fn boost_events(&self, window: &TimeWindow) -> FetchOutcome<OnchainEvent>;
}

/// Name of the indexer entity holding events of `kind`.
pub fn entity_name(kind: OnchainEventKind) -> &'static str {
    match kind {
        OnchainEventKind::Queue => "queueBoosts",
        OnchainEventKind::Activate => "activateBoosts",
        OnchainEventKind::Cancel => "cancelBoosts",
        OnchainEventKind::Drop => "dropBoosts",
    }
}

fn boost_events_query(entity: &str) -> String {
    format!(
        r#"query BoostEvents($limit: Int!, $offset: Int!, $startTimestamp: BigInt!, $endTimestamp: BigInt!) {{
  {entity}(
    limit: $limit
    offset: $offset
    orderBy: timestamp_ASC
    where: {{timestamp_gte: $startTimestamp, timestamp_lte: $endTimestamp}}
  ) {{
    user
    validator
    amount
    timestamp
  }}
}}"#
    )
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct BoostEventsVariables {
    limit: usize,
    offset: usize,
    start_timestamp: String,
    end_timestamp: String,
}

/// Offset-paginated reader of boost contract events.
#[derive(Clone, Debug)]
pub struct OnchainClient {
    graphql: GraphQlClient,
    page_size: usize,
}

impl OnchainClient {
    pub fn new(graphql: GraphQlClient) -> Self {
        Self { graphql, page_size: crate::config::DEFAULT_PAGE_SIZE }
    }

    pub fn from_config(config: &EndpointConfig) -> Self {
        Self::new(GraphQlClient::new(config.indexer_url.clone())).with_page_size(config.page_size)
    }

    pub fn with_page_size(self, page_size: usize) -> Self {
        Self { page_size: page_size.max(1), ..self }
    }

    /// Page through events of one kind with timestamps in `[start, end]` until a short page.
    pub async fn fetch_kind(
        &self,
        kind: OnchainEventKind,
        start: u64,
        end: u64,
    ) -> FetchOutcome<RawBoostEvent> {
        let entity = entity_name(kind);
        let query = boost_events_query(entity);
        let mut records = Vec::new();
        let mut pages = 0;

        loop {
            let variables = BoostEventsVariables {
                limit: self.page_size,
                offset: pages * self.page_size,
                start_timestamp: start.to_string(),
                end_timestamp: end.to_string(),
            };
            let page = match self.fetch_page(&query, entity, variables).await {
                Ok(page) => page,
                Err(err) => return FetchOutcome::interrupted(records, pages, err),
            };
            pages += 1;
            tracing::debug!("Fetched {} page {} with {} events", entity, pages, page.len());

            let short = page.len() < self.page_size;
            records.extend(page);
            if short {
                break;
            }
        }

        FetchOutcome::complete(records, pages)
    }

    async fn fetch_page(
        &self,
        query: &str,
        entity: &str,
        variables: BoostEventsVariables,
    ) -> Result<Vec<RawBoostEvent>, FetchError> {
        let mut data: HashMap<String, Option<Vec<RawBoostEvent>>> =
            self.graphql.query(query, variables).await?;
        data.remove(entity)
            .ok_or_else(|| FetchError::MissingField(entity.to_string()))
            .map(Option::unwrap_or_default)
    }
}

fn now_seconds() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}

#[async_trait]
impl OnchainSource for OnchainClient {
    async fn boost_events(&self, window: &TimeWindow) -> FetchOutcome<OnchainEvent> {
        let start = window.start.unwrap_or(0);
        let end = window.end.unwrap_or_else(now_seconds);

        let (queue, activate, cancel, dropped) = tokio::join!(
            self.fetch_kind(OnchainEventKind::Queue, start, end),
            self.fetch_kind(OnchainEventKind::Activate, start, end),
            self.fetch_kind(OnchainEventKind::Cancel, start, end),
            self.fetch_kind(OnchainEventKind::Drop, start, end),
        );

        let normalize = |kind: OnchainEventKind, outcome: FetchOutcome<RawBoostEvent>| {
            outcome.map(|raw| normalize_onchain_events(&raw, kind, window))
        };
        normalize(OnchainEventKind::Queue, queue)
            .merge(normalize(OnchainEventKind::Activate, activate))
            .merge(normalize(OnchainEventKind::Cancel, cancel))
            .merge(normalize(OnchainEventKind::Drop, dropped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_names() {
        let names: Vec<_> = OnchainEventKind::ALL.into_iter().map(entity_name).collect();
        assert_eq!(names, ["queueBoosts", "activateBoosts", "cancelBoosts", "dropBoosts"]);
    }

    #[test]
    fn test_query_selects_entity() {
        let query = boost_events_query("cancelBoosts");
        assert!(query.contains("cancelBoosts("));
        assert!(query.contains("orderBy: timestamp_ASC"));
        assert!(query.contains("timestamp_gte: $startTimestamp"));
    }

    #[test]
    fn test_variables_are_camel_case() {
        let variables = BoostEventsVariables {
            limit: 5,
            offset: 10,
            start_timestamp: "0".into(),
            end_timestamp: "99".into(),
        };
        assert_eq!(
            serde_json::to_value(&variables).unwrap(),
            serde_json::json!({"limit": 5, "offset": 10, "startTimestamp": "0", "endTimestamp": "99"})
        );
    }
}
