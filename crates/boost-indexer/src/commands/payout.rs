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

use alloy::primitives::Address;
use anyhow::ensure;
use boost_rewards::DEFAULT_TOLERANCE_MINUTES;
use clap::Args;

use super::write_output;
use crate::{
    chain::{connect, connect_with_signer, ChainReader, Erc20TransferExecutor},
    config::GlobalConfig,
    offchain::OffchainClient,
    onchain::OnchainClient,
    payout::{execute_plan, PayoutOrchestrator, PayoutRequest},
    revenue::FileRevenueSource,
};

/// Command to pay a referrer their share of a validator's incentive revenue.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct Payout {
    /// Referrer address; receives the payout.
    #[clap(long)]
    pub referrer: String,
    /// Validator whose revenue is shared.
    #[clap(long)]
    pub validator: Address,
    /// Operator of the validator.
    #[clap(long)]
    pub operator: Address,
    /// First block of the revenue range (inclusive).
    #[clap(long)]
    pub start_block: u64,
    /// Last block of the revenue range (inclusive).
    #[clap(long)]
    pub end_block: u64,
    /// JSON file with the validator's revenue per incentive token.
    #[clap(long)]
    pub revenues_file: PathBuf,
    /// Matching tolerance in minutes.
    #[clap(long, default_value_t = DEFAULT_TOLERANCE_MINUTES)]
    pub time_window: u64,
    /// Print the planned transfers without sending them.
    #[clap(long)]
    pub dry_run: bool,
    /// Write the plan to this JSON file.
    #[clap(long)]
    pub output: Option<PathBuf>,
    /// Continue with partial data if an upstream source fails part way through.
    #[clap(long)]
    pub allow_partial: bool,
}

impl Payout {
    /// Run the [Payout] command.
    pub async fn run(&self, global_config: &GlobalConfig) -> anyhow::Result<()> {
        ensure!(
            self.start_block <= self.end_block,
            "start block {} is after end block {}",
            self.start_block,
            self.end_block
        );
        let rpc_url = global_config.chain.require_rpc_url()?;
        // Fail before any fetching if the payout could not be sent anyway.
        let signer =
            if self.dry_run { None } else { Some(global_config.chain.require_private_key()?) };

        let provider = connect(&rpc_url).await?;
        let reader = ChainReader::new(provider, global_config.chain.bgt_address);
        let offchain = OffchainClient::from_config(&global_config.endpoints);
        let onchain = OnchainClient::from_config(&global_config.endpoints);
        let revenues = FileRevenueSource::new(&self.revenues_file);

        let orchestrator = PayoutOrchestrator {
            offchain: &offchain,
            onchain: &onchain,
            clock: &reader,
            ledger: &reader,
            revenues: &revenues,
        };
        let request = PayoutRequest {
            referrer: self.referrer.clone(),
            validator: self.validator,
            operator: self.operator,
            start_block: self.start_block,
            end_block: self.end_block,
            tolerance_minutes: self.time_window,
            allow_partial: self.allow_partial,
        };
        let plan = orchestrator.plan(&request).await?;

        println!("Delegated by referrer: {} of {} boosted", plan.delegated, plan.boostees);
        for instruction in &plan.instructions {
            println!(
                "Transfer {} of token {} to {}",
                instruction.amount, instruction.token, instruction.recipient
            );
        }
        write_output(self.output.as_deref(), &plan).await?;

        let Some(signer) = signer else {
            tracing::info!("Dry run; {} transfers not sent", plan.instructions.len());
            return Ok(());
        };
        let wallet = connect_with_signer(&rpc_url, signer).await?;
        let executor = Erc20TransferExecutor::new(wallet, global_config.chain.tx_timeout());
        let hashes = execute_plan(&plan, &executor).await?;
        for tx_hash in hashes {
            println!("Sent {tx_hash}");
        }
        Ok(())
    }
}
