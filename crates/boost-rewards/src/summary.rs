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

//! Aggregate statistics over verified delegations.

use std::collections::HashSet;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::{events::VerifiedDelegation, units::format_ether};

/// Totals over a set of verified delegations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationSummary {
    pub total_delegations: usize,
    /// Sum of delegated amounts, formatted in whole native tokens (18 decimals).
    pub total_delegated_amount: String,
    /// Number of distinct delegating addresses.
    pub unique_delegators: usize,
}

/// Sum of the delegated amounts in base units.
pub fn total_delegated(delegations: &[VerifiedDelegation]) -> U256 {
    delegations.iter().fold(U256::ZERO, |sum, d| sum.saturating_add(d.amount))
}

/// Summarize verified delegations.
pub fn summarize_delegations(delegations: &[VerifiedDelegation]) -> DelegationSummary {
    let unique_delegators = delegations.iter().map(|d| d.user).collect::<HashSet<_>>().len();
    DelegationSummary {
        total_delegations: delegations.len(),
        total_delegated_amount: format_ether(total_delegated(delegations)),
        unique_delegators,
    }
}
