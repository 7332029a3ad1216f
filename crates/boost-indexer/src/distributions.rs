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

use std::str::FromStr;

use alloy::primitives::U256;
use async_trait::async_trait;
use boost_rewards::{string_or_number, RewardTotals};
use serde::{Deserialize, Serialize};

use crate::{config::EndpointConfig, error::FetchError, graphql::GraphQlClient};

/// Source of the rewards accrued to the operator over a block range.
#[async_trait]
pub trait RewardSource: Send + Sync {
    async fn reward_totals(&self, start_block: u64, end_block: u64)
        -> Result<RewardTotals, FetchError>;
}

const DISTRIBUTIONS_QUERY: &str = r#"query Distributions($startBlock: BigInt!, $endBlock: BigInt!, $receiver: String!) {
  distributions(
    where: {blockNumber_gte: $startBlock, blockNumber_lte: $endBlock, receiver: $receiver}
    orderBy: blockNumber_ASC
  ) {
    blockNumber
    amount
    rewards {
      token
      amount
    }
  }
}"#;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct DistributionsVariables<'a> {
    start_block: String,
    end_block: String,
    receiver: &'a str,
}

#[derive(Deserialize, Debug)]
struct DistributionsData {
    distributions: Option<Vec<Distribution>>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Distribution {
    #[serde(deserialize_with = "string_or_number")]
    block_number: String,
    #[serde(default)]
    rewards: Vec<DistributionReward>,
}

#[derive(Deserialize, Debug)]
struct DistributionReward {
    token: String,
    #[serde(deserialize_with = "string_or_number")]
    amount: String,
}

fn sum_rewards(
    distributions: &[Distribution],
    start_block: u64,
    end_block: u64,
) -> Result<RewardTotals, FetchError> {
    let mut totals =
        RewardTotals { block_start: start_block, block_end: end_block, ..Default::default() };
    for distribution in distributions {
        for reward in &distribution.rewards {
            let pool = if reward.token.eq_ignore_ascii_case("bgt") {
                &mut totals.bgt
            } else if reward.token.eq_ignore_ascii_case("honey") {
                &mut totals.honey
            } else {
                continue;
            };
            let amount = U256::from_str(reward.amount.trim()).map_err(|_| {
                FetchError::InvalidValue(format!(
                    "reward amount {:?} at block {}",
                    reward.amount, distribution.block_number
                ))
            })?;
            *pool = pool.checked_add(amount).ok_or_else(|| {
                FetchError::InvalidValue(format!("{} rewards overflow", reward.token))
            })?;
        }
    }
    Ok(totals)
}

/// Reads reward distributions from the event indexer.
#[derive(Clone, Debug)]
pub struct DistributionsClient {
    graphql: GraphQlClient,
    receiver: String,
}

impl DistributionsClient {
    pub fn new(graphql: GraphQlClient, receiver: impl Into<String>) -> Self {
        Self { graphql, receiver: receiver.into() }
    }

    pub fn from_config(config: &EndpointConfig) -> Self {
        Self::new(GraphQlClient::new(config.indexer_url.clone()), config.owner_address.clone())
    }
}

#[async_trait]
impl RewardSource for DistributionsClient {
    async fn reward_totals(
        &self,
        start_block: u64,
        end_block: u64,
    ) -> Result<RewardTotals, FetchError> {
        let variables = DistributionsVariables {
            start_block: start_block.to_string(),
            end_block: end_block.to_string(),
            receiver: &self.receiver,
        };
        let data: DistributionsData = self.graphql.query(DISTRIBUTIONS_QUERY, variables).await?;
        let distributions =
            data.distributions.ok_or_else(|| FetchError::MissingField("distributions".into()))?;
        tracing::debug!(
            "Fetched {} distributions for blocks {} to {}",
            distributions.len(),
            start_block,
            end_block
        );
        sum_rewards(&distributions, start_block, end_block)
    }
}
