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

use boost_rewards::{format_ether, TimeWindow, DEFAULT_TOLERANCE_MINUTES};
use clap::Args;

use super::{parse_timestamp, write_output};
use crate::{
    config::GlobalConfig,
    distributions::DistributionsClient,
    offchain::OffchainClient,
    onchain::OnchainClient,
    service::{process_delegations_and_rewards, CheckOptions},
};

/// Command to apportion operator rewards over a block range to referrers.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct Rewards {
    /// Referrer whose attestations are checked.
    #[clap(long)]
    pub referrer: String,
    /// First block of the reward range (inclusive).
    #[clap(long)]
    pub start_block: u64,
    /// Last block of the reward range (inclusive).
    #[clap(long)]
    pub end_block: u64,
    /// Matching tolerance in minutes.
    #[clap(long, default_value_t = DEFAULT_TOLERANCE_MINUTES)]
    pub time_window: u64,
    /// Ignore delegation events before this date.
    #[clap(long, value_parser = parse_timestamp)]
    pub start_date: Option<u64>,
    /// Ignore delegation events after this date.
    #[clap(long, value_parser = parse_timestamp)]
    pub end_date: Option<u64>,
    /// Write the full report to this JSON file.
    #[clap(long)]
    pub output: Option<PathBuf>,
    /// Continue with partial data if an upstream source fails part way through.
    #[clap(long)]
    pub allow_partial: bool,
}

impl Rewards {
    /// Run the [Rewards] command.
    pub async fn run(&self, global_config: &GlobalConfig) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.start_block <= self.end_block,
            "start block {} is after end block {}",
            self.start_block,
            self.end_block
        );
        let endpoints = &global_config.endpoints;
        let offchain = OffchainClient::from_config(endpoints);
        let onchain = OnchainClient::from_config(endpoints);
        let distributions = DistributionsClient::from_config(endpoints);
        let options = CheckOptions {
            tolerance_minutes: self.time_window,
            window: TimeWindow::new(self.start_date, self.end_date),
            allow_partial: self.allow_partial,
        };

        let report = process_delegations_and_rewards(
            &offchain,
            &onchain,
            &distributions,
            &self.referrer,
            &options,
            self.start_block,
            self.end_block,
        )
        .await?;

        println!("Total delegations: {}", report.summary.total_delegations);
        println!("Total delegated amount: {} BGT", report.summary.total_delegated_amount);
        println!("Unique delegators: {}", report.summary.unique_delegators);
        println!("BGT rewards: {} BGT", format_ether(report.rewards.bgt));
        println!("HONEY rewards: {} HONEY", format_ether(report.rewards.honey));
        for share in &report.referrer_shares {
            println!(
                "{}: {:.2}% | {} BGT | {} HONEY",
                share.referrer,
                share.delegation_percentage,
                format_ether(share.bgt_share),
                format_ether(share.honey_share)
            );
        }

        write_output(self.output.as_deref(), &report).await
    }
}
