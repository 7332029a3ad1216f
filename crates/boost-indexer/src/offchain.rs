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

//! Client for the tag-indexed attestation log that records boosts made through the referral UI.

use async_trait::async_trait;
use boost_rewards::{
    normalize_offchain_records, OffchainEvent, OffchainEventKind, TaggedRecord, TimeWindow,
    TimestampUnit,
};
use serde::{Deserialize, Serialize};

use crate::{
    config::{EndpointConfig, SortOrder},
    error::FetchOutcome,
    graphql::GraphQlClient,
};

/// Source of normalized boost attestations.
#[async_trait]
pub trait OffchainSource: Send + Sync {
    /// Attestations credited to `referrer` that fall inside `window`.
    async fn boost_attestations(
        &self,
        referrer: &str,
        window: &TimeWindow,
    ) -> FetchOutcome<OffchainEvent>;
}

#[derive(Serialize, Debug)]
struct TagFilter<'a> {
    name: &'a str,
    values: Vec<&'a str>,
}

#[derive(Serialize, Debug)]
struct TransactionsVariables<'a> {
    owners: [&'a str; 1],
    tags: Vec<TagFilter<'a>>,
    first: usize,
    after: Option<&'a str>,
}

#[derive(Deserialize, Debug)]
struct TransactionsData {
    transactions: TransactionConnection,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TransactionConnection {
    edges: Vec<TransactionEdge>,
    page_info: PageInfo,
}

#[derive(Deserialize, Debug)]
struct TransactionEdge {
    node: TaggedRecord,
    cursor: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
}

fn transactions_query(order: SortOrder) -> String {
    format!(
        r#"query BoostAttestations($owners: [String!], $tags: [TagFilter!], $first: Int!, $after: String) {{
  transactions(owners: $owners, tags: $tags, first: $first, after: $after, order: {}) {{
    edges {{
      node {{
        id
        tags {{
          name
          value
        }}
      }}
      cursor
    }}
    pageInfo {{
      hasNextPage
    }}
  }}
}}"#,
        order.as_graphql()
    )
}

/// Cursor-paginated reader of boost attestations.
#[derive(Clone, Debug)]
pub struct OffchainClient {
    graphql: GraphQlClient,
    owner: String,
    page_size: usize,
    order: SortOrder,
    timestamp_unit: TimestampUnit,
    kinds: Vec<OffchainEventKind>,
}

impl OffchainClient {
    /// Create a client that reads queue and activate attestations.
    pub fn new(graphql: GraphQlClient, owner: impl Into<String>) -> Self {
        Self {
            graphql,
            owner: owner.into(),
            page_size: crate::config::DEFAULT_PAGE_SIZE,
            order: SortOrder::Asc,
            timestamp_unit: TimestampUnit::Seconds,
            kinds: vec![OffchainEventKind::QueueBoost, OffchainEventKind::ActivateBoost],
        }
    }

    pub fn from_config(config: &EndpointConfig) -> Self {
        Self::new(GraphQlClient::new(config.attestation_url.clone()), config.owner_address.clone())
            .with_page_size(config.page_size)
            .with_order(config.attestation_order)
            .with_timestamp_unit(config.timestamp_unit)
    }

    pub fn with_page_size(self, page_size: usize) -> Self {
        Self { page_size: page_size.max(1), ..self }
    }

    pub fn with_order(self, order: SortOrder) -> Self {
        Self { order, ..self }
    }

    pub fn with_timestamp_unit(self, timestamp_unit: TimestampUnit) -> Self {
        Self { timestamp_unit, ..self }
    }

    /// Page through every attestation for `referrer`, following cursors until the log reports no
    /// further pages.
    pub async fn fetch_records(&self, referrer: &str) -> FetchOutcome<TaggedRecord> {
        let query = transactions_query(self.order);
        let kinds: Vec<&str> = self.kinds.iter().map(|kind| kind.tag()).collect();
        let mut records = Vec::new();
        let mut pages = 0;
        let mut after: Option<String> = None;

        loop {
            let variables = TransactionsVariables {
                owners: [self.owner.as_str()],
                tags: vec![
                    TagFilter { name: "event", values: kinds.clone() },
                    TagFilter { name: "referrer", values: vec![referrer] },
                ],
                first: self.page_size,
                after: after.as_deref(),
            };
            let page = match self.graphql.query::<_, TransactionsData>(&query, variables).await {
                Ok(data) => data.transactions,
                Err(err) => return FetchOutcome::interrupted(records, pages, err),
            };
            pages += 1;
            tracing::debug!("Fetched attestation page {} with {} records", pages, page.edges.len());

            let cursor = page.edges.last().map(|edge| edge.cursor.clone());
            records.extend(page.edges.into_iter().map(|edge| edge.node));
            match (page.page_info.has_next_page, cursor) {
                (true, Some(cursor)) => after = Some(cursor),
                _ => break,
            }
        }

        FetchOutcome::complete(records, pages)
    }
}

#[async_trait]
impl OffchainSource for OffchainClient {
    async fn boost_attestations(
        &self,
        referrer: &str,
        window: &TimeWindow,
    ) -> FetchOutcome<OffchainEvent> {
        let unit = self.timestamp_unit;
        self.fetch_records(referrer)
            .await
            .map(|records| normalize_offchain_records(&records, unit, window))
    }
}
