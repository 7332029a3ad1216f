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

//! Proportional apportionment of validator rewards to referrers.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{
    events::VerifiedDelegation,
    summary::total_delegated,
    units::{mul_div_floor, ratio_percent},
};

/// Referrers receive `1 / REFERRER_CUT_DIVISOR` (25%) of their proportional share of each pool.
pub const REFERRER_CUT_DIVISOR: u64 = 4;

/// Rewards accrued to the operator over a block range, in base units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardTotals {
    #[serde(with = "crate::units::decimal")]
    pub bgt: U256,
    #[serde(with = "crate::units::decimal")]
    pub honey: U256,
    pub block_start: u64,
    pub block_end: u64,
}

/// A referrer's cut of the reward pools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferrerShare {
    pub referrer: Address,
    #[serde(with = "crate::units::decimal")]
    pub bgt_share: U256,
    #[serde(with = "crate::units::decimal")]
    pub honey_share: U256,
    /// Share of the total verified delegation volume, in percent. Informational only.
    pub delegation_percentage: f64,
}

fn referrer_cut(pool: U256, referrer_total: U256, total: U256) -> U256 {
    // floor(floor(x) / n) == floor(x / n) for integer n, so this is exact.
    mul_div_floor(pool, referrer_total, total).unwrap_or(U256::ZERO)
        / U256::from(REFERRER_CUT_DIVISOR)
}

/// Compute each referrer's share of `rewards`, keyed by the delegating user.
///
/// Shares are `floor(pool * referrer_total / total / 4)` computed exactly; a zero total yields
/// zero shares. Output is ordered by referrer address.
pub fn compute_referrer_shares(
    delegations: &[VerifiedDelegation],
    rewards: &RewardTotals,
) -> Vec<ReferrerShare> {
    let mut totals_by_referrer: BTreeMap<Address, U256> = BTreeMap::new();
    for delegation in delegations {
        let entry = totals_by_referrer.entry(delegation.user).or_default();
        *entry = entry.saturating_add(delegation.amount);
    }
    let total = total_delegated(delegations);

    totals_by_referrer
        .into_iter()
        .map(|(referrer, referrer_total)| ReferrerShare {
            referrer,
            bgt_share: referrer_cut(rewards.bgt, referrer_total, total),
            honey_share: referrer_cut(rewards.honey, referrer_total, total),
            delegation_percentage: ratio_percent(referrer_total, total),
        })
        .collect()
}
