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

//! Incentive revenue earned by a validator.
//!
//! Revenues come from an analytics warehouse that is queried out of band. The result is handed
//! to the payout command as a JSON file mapping token addresses to amounts:
//!
//! ```json
//! {
//!   "0x6969696969696969696969696969696969696969": { "amount": "1500000000000000000", "decimals": 18 }
//! }
//! ```

use std::{collections::BTreeMap, path::PathBuf};

use alloy::primitives::{Address, U256};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Revenue in one incentive token, in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRevenue {
    #[serde(with = "boost_rewards::units::decimal")]
    pub amount: U256,
    pub decimals: u8,
}

/// Revenue per incentive token. The zero address stands for BGT emissions.
pub type ValidatorRevenues = BTreeMap<Address, TokenRevenue>;

#[async_trait]
pub trait RevenueSource: Send + Sync {
    async fn revenues(
        &self,
        validator: Address,
        operator: Address,
        start_block: u64,
        end_block: u64,
    ) -> Result<ValidatorRevenues>;
}

/// Revenues exported to a JSON file.
#[derive(Clone, Debug)]
pub struct FileRevenueSource {
    path: PathBuf,
}

impl FileRevenueSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RevenueSource for FileRevenueSource {
    async fn revenues(
        &self,
        validator: Address,
        operator: Address,
        start_block: u64,
        end_block: u64,
    ) -> Result<ValidatorRevenues> {
        tracing::debug!(
            %validator,
            %operator,
            "Reading revenues for blocks {} to {} from {}",
            start_block,
            end_block,
            self.path.display()
        );
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read revenues file {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse revenues file {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    #[tokio::test]
    async fn test_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("revenues.json");
        std::fs::write(
            &path,
            r#"{
                "0x0000000000000000000000000000000000000000": {"amount": "42", "decimals": 18},
                "0x6969696969696969696969696969696969696969": {"amount": "1500000", "decimals": 6}
            }"#,
        )
        .unwrap();

        let revenues = FileRevenueSource::new(&path)
            .revenues(Address::ZERO, Address::ZERO, 1, 2)
            .await
            .unwrap();
        assert_eq!(revenues.len(), 2);
        assert_eq!(
            revenues[&address!("0x6969696969696969696969696969696969696969")],
            TokenRevenue { amount: U256::from(1_500_000u64), decimals: 6 }
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileRevenueSource::new(dir.path().join("absent.json"))
            .revenues(Address::ZERO, Address::ZERO, 1, 2)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("failed to read revenues file"));
    }
}
