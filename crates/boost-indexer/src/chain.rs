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

//! On-chain collaborators: block timestamps, boost totals and ERC-20 transfers.

use std::time::Duration;

use alloy::{
    primitives::{Address, TxHash, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::BlockNumberOrTag,
    signers::local::PrivateKeySigner,
    sol,
};
use anyhow::{ensure, Context, Result};
use async_trait::async_trait;
use url::Url;

use crate::payout::TransferInstruction;

sol! {
    #[sol(rpc)]
    interface IBGT {
        function boostees(address validator) external view returns (uint128);
    }

    #[sol(rpc)]
    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

/// Maps block numbers to their timestamps.
#[async_trait]
pub trait BlockClock: Send + Sync {
    /// Timestamp of `block`, in seconds.
    async fn block_timestamp(&self, block: u64) -> Result<u64>;
}

/// Reads boost totals from the BGT contract.
#[async_trait]
pub trait BoostLedger: Send + Sync {
    /// Total BGT boosted to `validator`.
    async fn boostees(&self, validator: Address) -> Result<U256>;
}

/// Sends token transfers.
#[async_trait]
pub trait TransferExecutor: Send + Sync {
    /// Execute `instruction`, returning the hash of the confirmed transaction.
    async fn execute(&self, instruction: &TransferInstruction) -> Result<TxHash>;
}

/// Connect a read-only provider to `rpc_url`.
pub async fn connect(rpc_url: &Url) -> Result<DynProvider> {
    let provider = ProviderBuilder::new()
        .connect(rpc_url.as_str())
        .await
        .with_context(|| format!("failed to connect provider to {rpc_url}"))?;
    Ok(provider.erased())
}

/// Connect a provider that signs with `signer` to `rpc_url`.
pub async fn connect_with_signer(rpc_url: &Url, signer: PrivateKeySigner) -> Result<DynProvider> {
    let provider = ProviderBuilder::new()
        .wallet(signer)
        .connect(rpc_url.as_str())
        .await
        .with_context(|| format!("failed to connect provider to {rpc_url}"))?;
    Ok(provider.erased())
}

/// [BlockClock] and [BoostLedger] backed by an RPC provider.
#[derive(Clone)]
pub struct ChainReader<P> {
    provider: P,
    bgt_address: Address,
}

impl<P: Provider> ChainReader<P> {
    pub fn new(provider: P, bgt_address: Address) -> Self {
        Self { provider, bgt_address }
    }
}

#[async_trait]
impl<P: Provider> BlockClock for ChainReader<P> {
    async fn block_timestamp(&self, block: u64) -> Result<u64> {
        let block_info = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(block))
            .await
            .with_context(|| format!("failed to fetch block {block}"))?
            .with_context(|| format!("block {block} not found"))?;
        Ok(block_info.header.timestamp)
    }
}

#[async_trait]
impl<P: Provider> BoostLedger for ChainReader<P> {
    async fn boostees(&self, validator: Address) -> Result<U256> {
        let bgt = IBGT::new(self.bgt_address, &self.provider);
        let boosted = bgt
            .boostees(validator)
            .call()
            .await
            .with_context(|| format!("failed to read boostees of {validator}"))?;
        Ok(U256::from(boosted))
    }
}

/// [TransferExecutor] that sends ERC-20 `transfer` calls from the provider's wallet.
#[derive(Clone)]
pub struct Erc20TransferExecutor<P> {
    provider: P,
    timeout: Duration,
}

impl<P: Provider> Erc20TransferExecutor<P> {
    pub fn new(provider: P, timeout: Duration) -> Self {
        Self { provider, timeout }
    }
}

#[async_trait]
impl<P: Provider> TransferExecutor for Erc20TransferExecutor<P> {
    async fn execute(&self, instruction: &TransferInstruction) -> Result<TxHash> {
        let token = IERC20::new(instruction.token, &self.provider);
        let pending_tx = token
            .transfer(instruction.recipient, instruction.amount)
            .send()
            .await
            .with_context(|| format!("failed to send transfer of token {}", instruction.token))?;

        let tx_hash = *pending_tx.tx_hash();
        tracing::info!(
            %tx_hash,
            "Sent transfer of {} of token {}",
            instruction.amount,
            instruction.token
        );

        tracing::debug!(timeout = ?self.timeout, %tx_hash, "Waiting for transaction receipt");
        let receipt = pending_tx
            .with_timeout(Some(self.timeout))
            .get_receipt()
            .await
            .with_context(|| format!("failed to receive receipt for transfer {tx_hash}"))?;

        ensure!(
            receipt.status(),
            "transfer of token {} failed: tx_hash = {}",
            instruction.token,
            receipt.transaction_hash
        );
        Ok(receipt.transaction_hash)
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        primitives::{address, keccak256},
        sol_types::SolCall,
    };

    use super::*;

    #[test]
    fn test_boostees_call_encoding() {
        let validator = address!("0x00000000000000000000000000000000000000aa");
        let encoded = IBGT::boosteesCall { validator }.abi_encode();
        assert_eq!(encoded.len(), 4 + 32);
        assert_eq!(&encoded[..4], &keccak256("boostees(address)")[..4]);
        assert_eq!(&encoded[16..], validator.as_slice());
    }

    #[test]
    fn test_transfer_call_encoding() {
        let call = IERC20::transferCall { to: Address::ZERO, amount: U256::from(7u64) };
        let encoded = call.abi_encode();
        assert_eq!(&encoded[..4], &keccak256("transfer(address,uint256)")[..4]);
        assert_eq!(encoded[encoded.len() - 1], 7);
    }
}
