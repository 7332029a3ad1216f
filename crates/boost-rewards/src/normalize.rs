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

//! Conversion of raw attestation records and raw contract events into canonical events.
//!
//! Malformed records never raise: a record without a usable address or kind is dropped, while
//! missing numeric tags on attestations default to zero.

use std::str::FromStr;

use alloy_primitives::{Address, U256};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::events::{OffchainEvent, OffchainEventKind, OnchainEvent, OnchainEventKind, TimeWindow};

/// Unit of the `timestamp` tag written by the attestation log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampUnit {
    #[default]
    Seconds,
    Milliseconds,
}

impl TimestampUnit {
    /// Convert a raw timestamp in this unit to seconds, flooring sub-second precision.
    pub fn to_seconds(&self, raw: u64) -> u64 {
        match self {
            Self::Seconds => raw,
            Self::Milliseconds => raw / 1000,
        }
    }
}

impl FromStr for TimestampUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s" | "sec" | "seconds" => Ok(Self::Seconds),
            "ms" | "millis" | "milliseconds" => Ok(Self::Milliseconds),
            other => Err(format!("unknown timestamp unit: {other}")),
        }
    }
}

/// A name/value tag attached to an attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

/// An attestation as stored in the tag-indexed transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedRecord {
    pub id: String,
    pub tags: Vec<Tag>,
}

impl TaggedRecord {
    /// Value of the first tag named `name`.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.iter().find(|tag| tag.name == name).map(|tag| tag.value.as_str())
    }
}

/// A boost event as returned by the on-chain event indexer.
///
/// Indexers commonly render big integers either as JSON strings or numbers; both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBoostEvent {
    pub user: String,
    pub validator: String,
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
    #[serde(deserialize_with = "string_or_number")]
    pub timestamp: String,
}

/// Accept a JSON string or an unsigned integer, yielding its decimal text.
pub fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => Ok(s),
        StringOrNumber::Number(n) if n.is_u64() => Ok(n.to_string()),
        StringOrNumber::Number(n) => Err(de::Error::custom(format!("not an unsigned integer: {n}"))),
    }
}

fn parse_u64_or_zero(value: Option<&str>) -> u64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

fn parse_u256_or_zero(value: Option<&str>) -> U256 {
    value.and_then(|v| U256::from_str(v.trim()).ok()).unwrap_or(U256::ZERO)
}

/// Normalize a single attestation.
///
/// Returns `None` when the record has no recognised `event` tag, no valid `address`, or falls
/// outside `window` once its timestamp has been converted to seconds.
pub fn normalize_offchain(
    record: &TaggedRecord,
    unit: TimestampUnit,
    window: &TimeWindow,
) -> Option<OffchainEvent> {
    let kind = record.tag("event").and_then(OffchainEventKind::from_tag)?;
    let address = record.tag("address").and_then(|a| Address::from_str(a.trim()).ok())?;
    let timestamp = unit.to_seconds(parse_u64_or_zero(record.tag("timestamp")));
    if !window.contains(timestamp) {
        return None;
    }

    Some(OffchainEvent {
        referrer: record.tag("referrer").unwrap_or_default().to_string(),
        address,
        timestamp,
        quantity: parse_u256_or_zero(record.tag("quantity")),
        kind,
    })
}

/// Normalize a single contract event of the given kind.
///
/// Unlike attestations, contract events carry no defaults: an unparseable field drops the event.
pub fn normalize_onchain(
    raw: &RawBoostEvent,
    kind: OnchainEventKind,
    window: &TimeWindow,
) -> Option<OnchainEvent> {
    let user = Address::from_str(raw.user.trim()).ok()?;
    let validator = Address::from_str(raw.validator.trim()).ok()?;
    let amount = U256::from_str(raw.amount.trim()).ok()?;
    let timestamp: u64 = raw.timestamp.trim().parse().ok()?;
    if !window.contains(timestamp) {
        return None;
    }
    Some(OnchainEvent { user, validator, amount, timestamp, kind })
}

/// Normalize a batch of attestations, logging how many were dropped.
pub fn normalize_offchain_records<'a>(
    records: impl IntoIterator<Item = &'a TaggedRecord>,
    unit: TimestampUnit,
    window: &TimeWindow,
) -> Vec<OffchainEvent> {
    let mut dropped = 0usize;
    let events: Vec<_> = records
        .into_iter()
        .filter_map(|record| {
            let event = normalize_offchain(record, unit, window);
            if event.is_none() {
                tracing::debug!("Dropping attestation {}", record.id);
                dropped += 1;
            }
            event
        })
        .collect();
    if dropped > 0 {
        tracing::debug!("Dropped {} attestations during normalization", dropped);
    }
    events
}

/// Normalize a batch of contract events of one kind, logging malformed ones.
pub fn normalize_onchain_events<'a>(
    raw_events: impl IntoIterator<Item = &'a RawBoostEvent>,
    kind: OnchainEventKind,
    window: &TimeWindow,
) -> Vec<OnchainEvent> {
    raw_events
        .into_iter()
        .filter_map(|raw| {
            let event = normalize_onchain(raw, kind, window);
            if event.is_none() && window.contains(raw.timestamp.trim().parse().unwrap_or(0)) {
                tracing::warn!("Dropping malformed {:?} event: {:?}", kind, raw);
            }
            event
        })
        .collect()
}
