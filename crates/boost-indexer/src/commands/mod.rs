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

//! Commands of the `boost-verifier` CLI.

mod check_delegation;
mod payout;
mod rewards;

pub use check_delegation::CheckDelegation;
pub use payout::Payout;
pub use rewards::Rewards;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};
use clap::Subcommand;
use serde::Serialize;

use crate::config::GlobalConfig;

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Verify a referrer's delegations against the boost contract events.
    CheckDelegation(CheckDelegation),
    /// Verify delegations and compute referrer shares of the rewards over a block range.
    Rewards(Rewards),
    /// Pay a referrer their share of a validator's incentive revenue.
    Payout(Payout),
}

impl Command {
    /// Run the command.
    pub async fn run(&self, global_config: &GlobalConfig) -> Result<()> {
        match self {
            Self::CheckDelegation(cmd) => cmd.run(global_config).await,
            Self::Rewards(cmd) => cmd.run(global_config).await,
            Self::Payout(cmd) => cmd.run(global_config).await,
        }
    }
}

/// Parse a date given as RFC 3339, `YYYY-MM-DD` (midnight UTC) or unix seconds.
pub fn parse_timestamp(value: &str) -> Result<u64, String> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Ok(seconds);
    }
    let seconds = if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        datetime.timestamp()
    } else {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|datetime| datetime.and_utc().timestamp())
            .ok_or_else(|| format!("invalid date: {value}"))?
    };
    u64::try_from(seconds).map_err(|_| format!("date before the unix epoch: {value}"))
}

/// Write `value` as pretty JSON to `path`, if one was given.
pub(crate) async fn write_output(path: Option<&Path>, value: &impl Serialize) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("failed to write output to {}", path.display()))?;
    tracing::info!("Results written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("1700000000").unwrap(), 1_700_000_000);
        assert_eq!(parse_timestamp("2024-01-01").unwrap(), 1_704_067_200);
        assert_eq!(parse_timestamp("2024-01-01T00:10:00Z").unwrap(), 1_704_067_800);
        assert_eq!(parse_timestamp("2024-01-01T02:00:00+02:00").unwrap(), 1_704_067_200);
        assert!(parse_timestamp("yesterday").is_err());
        assert!(parse_timestamp("1960-01-01").is_err());
    }

    #[tokio::test]
    async fn test_write_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_output(Some(&path), &serde_json::json!({"ok": true})).await.unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["ok"], true);

        write_output(None, &1).await.unwrap();
    }
}
