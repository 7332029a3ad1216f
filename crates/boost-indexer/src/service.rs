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

//! Pipelines wiring the upstream sources into the verification core.

use anyhow::{Context, Result};
use boost_rewards::{
    compute_referrer_shares, format_ether, match_delegations, summarize_delegations,
    DelegationSummary, ReferrerShare, RewardTotals, TimeWindow, VerifiedDelegation,
    DEFAULT_TOLERANCE_MINUTES,
};
use serde::Serialize;

use crate::{distributions::RewardSource, offchain::OffchainSource, onchain::OnchainSource};

/// Parameters of a delegation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    /// Matching tolerance, in minutes.
    pub tolerance_minutes: u64,
    /// Restricts both sources to events inside this window.
    pub window: TimeWindow,
    /// Continue with the records gathered so far when a source fails part way through.
    pub allow_partial: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            tolerance_minutes: DEFAULT_TOLERANCE_MINUTES,
            window: TimeWindow::default(),
            allow_partial: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationCheck {
    pub summary: DelegationSummary,
    pub verified_delegations: Vec<VerifiedDelegation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardReport {
    pub summary: DelegationSummary,
    pub verified_delegations: Vec<VerifiedDelegation>,
    pub rewards: RewardTotals,
    pub referrer_shares: Vec<ReferrerShare>,
}

/// Fetch both event sources for `referrer` and verify the delegations they agree on.
pub async fn check_delegation(
    offchain: &dyn OffchainSource,
    onchain: &dyn OnchainSource,
    referrer: &str,
    options: &CheckOptions,
) -> Result<DelegationCheck> {
    tracing::info!("Fetching delegations for referrer {}", referrer);
    let (attestations, events) = tokio::join!(
        offchain.boost_attestations(referrer, &options.window),
        onchain.boost_events(&options.window),
    );
    let attestations = attestations.resolve("attestations", options.allow_partial)?;
    let events = events.resolve("boost events", options.allow_partial)?;
    tracing::info!(
        "Fetched {} attestations and {} boost events",
        attestations.len(),
        events.len()
    );

    tracing::info!("Matching delegations with a {} minute tolerance", options.tolerance_minutes);
    let verified_delegations =
        match_delegations(&attestations, &events, options.tolerance_minutes);
    let summary = summarize_delegations(&verified_delegations);
    tracing::info!(
        "Verified {} delegations totalling {} from {} delegators",
        summary.total_delegations,
        summary.total_delegated_amount,
        summary.unique_delegators
    );

    Ok(DelegationCheck { summary, verified_delegations })
}

/// Verify delegations, then apportion the rewards accrued over `[start_block, end_block]`.
pub async fn process_delegations_and_rewards(
    offchain: &dyn OffchainSource,
    onchain: &dyn OnchainSource,
    rewards: &dyn RewardSource,
    referrer: &str,
    options: &CheckOptions,
    start_block: u64,
    end_block: u64,
) -> Result<RewardReport> {
    let DelegationCheck { summary, verified_delegations } =
        check_delegation(offchain, onchain, referrer, options).await?;

    let rewards = rewards
        .reward_totals(start_block, end_block)
        .await
        .with_context(|| {
            format!("failed to fetch rewards for blocks {start_block} to {end_block}")
        })?;
    tracing::info!(
        "Rewards for blocks {} to {}: {} BGT, {} HONEY",
        rewards.block_start,
        rewards.block_end,
        format_ether(rewards.bgt),
        format_ether(rewards.honey)
    );

    let referrer_shares = compute_referrer_shares(&verified_delegations, &rewards);
    for share in &referrer_shares {
        tracing::info!(
            "Referrer {}: {:.2}% of delegations, {} BGT, {} HONEY",
            share.referrer,
            share.delegation_percentage,
            format_ether(share.bgt_share),
            format_ether(share.honey_share)
        );
    }

    Ok(RewardReport { summary, verified_delegations, rewards, referrer_shares })
}
