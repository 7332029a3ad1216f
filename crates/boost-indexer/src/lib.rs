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

//! Fetch layer, orchestration and CLI for boost delegation verification.
//!
//! Attestations are read from a tag-indexed log ([offchain]) and contract events from an event
//! indexer ([onchain]). [service] feeds both into the [boost_rewards] core, and [payout] turns
//! verified delegations into token transfers.

pub mod chain;
pub mod commands;
pub mod config;
pub mod distributions;
pub mod error;
pub mod graphql;
pub mod offchain;
pub mod onchain;
pub mod payout;
pub mod revenue;
pub mod service;

pub use error::{FetchError, FetchOutcome};
pub use service::{
    check_delegation, process_delegations_and_rewards, CheckOptions, DelegationCheck,
    RewardReport,
};
