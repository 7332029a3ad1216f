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

//! Canonical event shapes for both sides of a boost and the verified delegation they produce.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Lifecycle transition recorded by the off-chain attestation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffchainEventKind {
    QueueBoost,
    ActivateBoost,
    CancelBoost,
    DropBoost,
}

impl OffchainEventKind {
    pub const ALL: [OffchainEventKind; 4] =
        [Self::QueueBoost, Self::ActivateBoost, Self::CancelBoost, Self::DropBoost];

    /// Value of the `event` tag for this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::QueueBoost => "queue_boost",
            Self::ActivateBoost => "activate_boost",
            Self::CancelBoost => "cancel_boost",
            Self::DropBoost => "drop_boost",
        }
    }

    /// Parse the value of an `event` tag. Unknown values yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

/// Lifecycle transition emitted by the staking contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnchainEventKind {
    Queue,
    Activate,
    Cancel,
    Drop,
}

impl OnchainEventKind {
    pub const ALL: [OnchainEventKind; 4] = [Self::Queue, Self::Activate, Self::Cancel, Self::Drop];
}

/// A normalized off-chain attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffchainEvent {
    /// Referrer credited by the attestation.
    pub referrer: String,
    /// Address of the delegating user.
    pub address: Address,
    /// Timestamp in seconds.
    pub timestamp: u64,
    /// Quantity in token base units.
    #[serde(with = "crate::units::decimal")]
    pub quantity: U256,
    pub kind: OffchainEventKind,
}

/// A normalized on-chain boost event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnchainEvent {
    pub user: Address,
    pub validator: Address,
    #[serde(with = "crate::units::decimal")]
    pub amount: U256,
    /// Block timestamp in seconds.
    pub timestamp: u64,
    pub kind: OnchainEventKind,
}

/// A delegation both sources agree happened.
///
/// Only [crate::match_delegations] creates these. The amount is taken from the on-chain queue
/// event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedDelegation {
    pub user: Address,
    pub validator: Address,
    #[serde(with = "crate::units::decimal")]
    pub amount: U256,
    pub offchain_queue_timestamp: u64,
    pub onchain_queue_timestamp: u64,
    pub offchain_activate_timestamp: u64,
    pub onchain_activate_timestamp: u64,
}

/// Inclusive time window in seconds. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl TimeWindow {
    pub fn new(start: Option<u64>, end: Option<u64>) -> Self {
        Self { start, end }
    }

    /// Whether `timestamp` falls inside the window.
    pub fn contains(&self, timestamp: u64) -> bool {
        self.start.is_none_or(|start| timestamp >= start)
            && self.end.is_none_or(|end| timestamp <= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offchain_kind_tags() {
        for kind in OffchainEventKind::ALL {
            assert_eq!(OffchainEventKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(OffchainEventKind::from_tag("QUEUE_BOOST"), None);
        assert_eq!(OffchainEventKind::from_tag("mint"), None);
    }

    #[test]
    fn test_time_window_is_inclusive() {
        let window = TimeWindow::new(Some(100), Some(200));
        assert!(window.contains(100));
        assert!(window.contains(200));
        assert!(!window.contains(99));
        assert!(!window.contains(201));

        let open = TimeWindow::default();
        assert!(open.contains(0));
        assert!(open.contains(u64::MAX));
        assert!(TimeWindow::new(None, Some(5)).contains(0));
    }

    #[test]
    fn test_verified_delegation_serializes_decimal_amount() {
        let delegation = VerifiedDelegation {
            user: Address::repeat_byte(0xaa),
            validator: Address::repeat_byte(0xbb),
            amount: U256::from(10u64).pow(U256::from(24)),
            offchain_queue_timestamp: 1,
            onchain_queue_timestamp: 2,
            offchain_activate_timestamp: 3,
            onchain_activate_timestamp: 4,
        };
        let json = serde_json::to_value(&delegation).unwrap();
        assert_eq!(json["amount"], "1000000000000000000000000");
        assert_eq!(json["onchainActivateTimestamp"], 4);
    }
}
