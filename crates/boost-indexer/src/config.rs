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

//! Configuration shared by the `boost-verifier` commands.

use std::{num::ParseIntError, time::Duration};

use alloy::{
    primitives::{address, Address},
    signers::local::PrivateKeySigner,
};
use anyhow::{Context, Result};
use boost_rewards::TimestampUnit;
use clap::{Args, ValueEnum};
use url::Url;

/// Address of the BGT token contract, which also tracks boosts per validator.
pub const BGT_ADDRESS: Address = address!("0xbDa130737BDd9618301681329bF2e46A016ff9Ad");

/// Number of records requested per page from either indexer.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Transaction timeout used when none is configured.
pub const DEFAULT_TX_TIMEOUT: Duration = Duration::from_secs(180);

/// Ordering requested from the attestation log.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_graphql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Locations of the upstream indexers.
#[derive(Args, Debug, Clone)]
pub struct EndpointConfig {
    /// GraphQL endpoint of the tag-indexed attestation log
    #[clap(long, env = "ATTESTATION_GRAPHQL_URL")]
    pub attestation_url: Url,

    /// GraphQL endpoint of the boost event and distribution indexer
    #[clap(long, env = "INDEXER_GRAPHQL_URL")]
    pub indexer_url: Url,

    /// Owner of the attestations, also the receiver of the tracked reward distributions
    #[clap(long, env = "OWNER_ADDRESS")]
    pub owner_address: String,

    /// Records requested per page
    #[clap(long, env = "PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Unit of the timestamp tag written by the attestation log (seconds or milliseconds)
    #[clap(long, env = "ATTESTATION_TIMESTAMP_UNIT", default_value = "seconds")]
    pub timestamp_unit: TimestampUnit,

    /// Order in which attestations are paged
    #[clap(long, value_enum, default_value_t = SortOrder::Asc)]
    pub attestation_order: SortOrder,
}

/// Options for commands that read from or write to the chain.
#[derive(Args, Debug, Clone)]
pub struct ChainConfig {
    /// URL of the Ethereum RPC endpoint
    #[clap(long, env = "RPC_URL")]
    pub rpc_url: Option<Url>,

    /// Private key of the wallet sending payouts
    #[clap(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<PrivateKeySigner>,

    /// Address of the BGT contract
    #[clap(long, env = "BGT_ADDRESS", default_value_t = BGT_ADDRESS)]
    pub bgt_address: Address,

    /// Ethereum transaction timeout in seconds.
    #[clap(long, env = "TX_TIMEOUT", value_parser = |arg: &str| -> Result<Duration, ParseIntError> {Ok(Duration::from_secs(arg.parse()?))})]
    pub tx_timeout: Option<Duration>,
}

impl ChainConfig {
    /// Access [Self::rpc_url] or return an error that can be shown to the user.
    pub fn require_rpc_url(&self) -> Result<Url> {
        self.rpc_url
            .clone()
            .context("Blockchain RPC URL not provided; please set --rpc-url or the RPC_URL env var")
    }

    /// Access [Self::private_key] or return an error that can be shown to the user.
    pub fn require_private_key(&self) -> Result<PrivateKeySigner> {
        self.private_key.clone().context(
            "Private key not provided; please set --private-key or the PRIVATE_KEY env var",
        )
    }

    pub fn tx_timeout(&self) -> Duration {
        self.tx_timeout.unwrap_or(DEFAULT_TX_TIMEOUT)
    }
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalConfig {
    #[clap(flatten, next_help_heading = "Endpoints")]
    pub endpoints: EndpointConfig,

    #[clap(flatten, next_help_heading = "Chain")]
    pub chain: ChainConfig,
}
