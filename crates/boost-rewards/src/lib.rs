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

//! Verification of boost delegations against two independent event sources, and apportionment
//! of validator rewards to referrers.
//!
//! The crate is synchronous and performs no I/O. Callers fetch attestations and contract events,
//! normalize them with [normalize], match them with [match_delegations], and then summarize or
//! apportion the verified set.

pub mod events;
pub mod matching;
pub mod normalize;
pub mod shares;
pub mod summary;
pub mod units;

pub use events::{
    OffchainEvent, OffchainEventKind, OnchainEvent, OnchainEventKind, TimeWindow,
    VerifiedDelegation,
};

pub use matching::{
    find_closest_matching_event, match_delegations, AMOUNT_TOLERANCE_DIVISOR,
    DEFAULT_TOLERANCE_MINUTES,
};

pub use normalize::{
    normalize_offchain, normalize_offchain_records, normalize_onchain, normalize_onchain_events,
    string_or_number, RawBoostEvent, Tag, TaggedRecord, TimestampUnit,
};

pub use shares::{compute_referrer_shares, ReferrerShare, RewardTotals, REFERRER_CUT_DIVISOR};

pub use summary::{summarize_delegations, total_delegated, DelegationSummary};

pub use units::{format_ether, format_units, mul_div_floor};
