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

use std::path::PathBuf;

use boost_rewards::{TimeWindow, DEFAULT_TOLERANCE_MINUTES};
use clap::Args;

use super::{parse_timestamp, write_output};
use crate::{
    config::GlobalConfig,
    offchain::OffchainClient,
    onchain::OnchainClient,
    service::{check_delegation, CheckOptions},
};

/// Command to verify a referrer's delegations.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct CheckDelegation {
    /// Referrer whose attestations are checked.
    #[clap(long)]
    pub referrer: String,
    /// Matching tolerance in minutes.
    #[clap(long, default_value_t = DEFAULT_TOLERANCE_MINUTES)]
    pub time_window: u64,
    /// Ignore events before this date (RFC 3339, YYYY-MM-DD or unix seconds).
    #[clap(long, value_parser = parse_timestamp)]
    pub start_date: Option<u64>,
    /// Ignore events after this date (RFC 3339, YYYY-MM-DD or unix seconds).
    #[clap(long, value_parser = parse_timestamp)]
    pub end_date: Option<u64>,
    /// Write the summary and verified delegations to this JSON file.
    #[clap(long)]
    pub output: Option<PathBuf>,
    /// Continue with partial data if an upstream source fails part way through.
    #[clap(long)]
    pub allow_partial: bool,
}

impl CheckDelegation {
    /// Run the [CheckDelegation] command.
    pub async fn run(&self, global_config: &GlobalConfig) -> anyhow::Result<()> {
        let offchain = OffchainClient::from_config(&global_config.endpoints);
        let onchain = OnchainClient::from_config(&global_config.endpoints);
        let options = CheckOptions {
            tolerance_minutes: self.time_window,
            window: TimeWindow::new(self.start_date, self.end_date),
            allow_partial: self.allow_partial,
        };

        let check = check_delegation(&offchain, &onchain, &self.referrer, &options).await?;

        println!("Total delegations: {}", check.summary.total_delegations);
        println!("Total delegated amount: {} BGT", check.summary.total_delegated_amount);
        println!("Unique delegators: {}", check.summary.unique_delegators);

        write_output(self.output.as_deref(), &check).await
    }
}
