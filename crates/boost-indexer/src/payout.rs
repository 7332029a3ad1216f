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

//! Planning and execution of referral payouts in validator incentive tokens.

use std::str::FromStr;

use alloy::primitives::{Address, TxHash, U256};
use anyhow::{Context, Result};
use boost_rewards::{format_units, mul_div_floor, total_delegated, DelegationSummary, TimeWindow};
use serde::Serialize;

use crate::{
    chain::{BlockClock, BoostLedger, TransferExecutor},
    offchain::OffchainSource,
    onchain::OnchainSource,
    revenue::{RevenueSource, ValidatorRevenues},
    service::{check_delegation, CheckOptions},
};

/// A single token transfer to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferInstruction {
    pub token: Address,
    pub recipient: Address,
    #[serde(with = "boost_rewards::units::decimal")]
    pub amount: U256,
}

/// What to pay out, and to whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutRequest {
    /// Referrer tag value; also the payout recipient, so it must be an address.
    pub referrer: String,
    pub validator: Address,
    pub operator: Address,
    pub start_block: u64,
    pub end_block: u64,
    pub tolerance_minutes: u64,
    pub allow_partial: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutPlan {
    pub referrer: Address,
    pub validator: Address,
    pub start_timestamp: u64,
    pub end_timestamp: u64,
    pub summary: DelegationSummary,
    #[serde(with = "boost_rewards::units::decimal")]
    pub delegated: U256,
    #[serde(with = "boost_rewards::units::decimal")]
    pub boostees: U256,
    pub instructions: Vec<TransferInstruction>,
}

/// Scale each revenue by `delegated / boostees`, rounding down.
///
/// The zero-address entry (BGT emissions) and amounts that round to zero are skipped. The
/// proportion is capped at one so a referrer is never paid more than the validator earned.
pub fn scale_revenues(
    revenues: &ValidatorRevenues,
    recipient: Address,
    delegated: U256,
    boostees: U256,
) -> Vec<TransferInstruction> {
    if boostees.is_zero() {
        tracing::warn!("Validator has no boosts; nothing to pay out");
        return Vec::new();
    }
    if delegated > boostees {
        tracing::warn!(
            "Verified delegations ({}) exceed boostees ({}); capping proportion at 100%",
            delegated,
            boostees
        );
    }
    let delegated = delegated.min(boostees);

    revenues
        .iter()
        .filter_map(|(token, revenue)| {
            if token.is_zero() {
                tracing::debug!("Skipping native BGT revenue");
                return None;
            }
            let amount = mul_div_floor(revenue.amount, delegated, boostees)?;
            if amount.is_zero() {
                tracing::debug!("Share of token {} rounds to zero", token);
                return None;
            }
            tracing::debug!(
                "Token {}: {} of {}",
                token,
                format_units(amount, revenue.decimals),
                format_units(revenue.amount, revenue.decimals)
            );
            Some(TransferInstruction { token: *token, recipient, amount })
        })
        .collect()
}

/// Gathers everything needed to plan a payout.
pub struct PayoutOrchestrator<'a> {
    pub offchain: &'a dyn OffchainSource,
    pub onchain: &'a dyn OnchainSource,
    pub clock: &'a dyn BlockClock,
    pub ledger: &'a dyn BoostLedger,
    pub revenues: &'a dyn RevenueSource,
}

impl PayoutOrchestrator<'_> {
    /// Plan the transfers owed to the referrer in `request`. Nothing is sent.
    pub async fn plan(&self, request: &PayoutRequest) -> Result<PayoutPlan> {
        let recipient = Address::from_str(request.referrer.trim())
            .with_context(|| format!("referrer {} is not an address", request.referrer))?;

        let (start_timestamp, end_timestamp) = tokio::try_join!(
            self.clock.block_timestamp(request.start_block),
            self.clock.block_timestamp(request.end_block),
        )?;
        tracing::info!(
            "Blocks {} to {} span timestamps {} to {}",
            request.start_block,
            request.end_block,
            start_timestamp,
            end_timestamp
        );

        let options = CheckOptions {
            tolerance_minutes: request.tolerance_minutes,
            window: TimeWindow::new(Some(start_timestamp), Some(end_timestamp)),
            allow_partial: request.allow_partial,
        };
        let check =
            check_delegation(self.offchain, self.onchain, &request.referrer, &options).await?;
        let delegated = total_delegated(&check.verified_delegations);

        let boostees = self.ledger.boostees(request.validator).await?;
        let revenues = self
            .revenues
            .revenues(request.validator, request.operator, request.start_block, request.end_block)
            .await
            .context("failed to fetch validator revenues")?;
        tracing::info!(
            "Referrer delegated {} of {} boosted to validator {}",
            delegated,
            boostees,
            request.validator
        );

        let instructions = scale_revenues(&revenues, recipient, delegated, boostees);
        Ok(PayoutPlan {
            referrer: recipient,
            validator: request.validator,
            start_timestamp,
            end_timestamp,
            summary: check.summary,
            delegated,
            boostees,
            instructions,
        })
    }
}

/// Execute the instructions of `plan` in order, stopping at the first failure.
pub async fn execute_plan(
    plan: &PayoutPlan,
    executor: &dyn TransferExecutor,
) -> Result<Vec<TxHash>> {
    let mut hashes = Vec::with_capacity(plan.instructions.len());
    for instruction in &plan.instructions {
        let tx_hash = executor.execute(instruction).await.with_context(|| {
            let total = plan.instructions.len();
            format!("payout stopped after {} of {} transfers", hashes.len(), total)
        })?;
        hashes.push(tx_hash);
    }
    tracing::info!("Completed {} transfers to {}", hashes.len(), plan.referrer);
    Ok(hashes)
}
