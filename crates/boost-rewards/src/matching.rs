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

//! Tolerant one-to-one matching of off-chain attestations against on-chain boost events.
//!
//! Every off-chain queue attestation is paired with the closest on-chain queue event, checked
//! against cancellations and exact amounts, and then completed by pairing one of the user's
//! off-chain activations with an on-chain activation for the same user and validator. Each event
//! participates in at most one [VerifiedDelegation]; consumed events are tracked with explicit
//! markers so the caller's inputs are never mutated.

use alloy_primitives::U256;

use crate::events::{
    OffchainEvent, OffchainEventKind, OnchainEvent, OnchainEventKind, VerifiedDelegation,
};

/// Default correlation window, in minutes.
pub const DEFAULT_TOLERANCE_MINUTES: u64 = 10;

/// A candidate is within the amount tolerance when `|quantity - amount| * DIVISOR <= quantity`,
/// i.e. a 10% relative deviation.
pub const AMOUNT_TOLERANCE_DIVISOR: u64 = 10;

fn abs_diff(a: U256, b: U256) -> U256 {
    if a >= b {
        a - b
    } else {
        b - a
    }
}

/// Working partition of events sorted by timestamp, with consumed markers.
struct Pool<'a, T> {
    events: Vec<&'a T>,
    consumed: Vec<bool>,
}

impl<'a, T> Pool<'a, T> {
    fn new(events: impl Iterator<Item = &'a T>, timestamp: impl Fn(&T) -> u64) -> Self {
        let mut events: Vec<&'a T> = events.collect();
        // Stable, so equal timestamps keep their input order.
        events.sort_by_key(|e| timestamp(e));
        let consumed = vec![false; events.len()];
        Self { events, consumed }
    }

    fn available(&self) -> impl Iterator<Item = (usize, &'a T)> + '_ {
        self.events.iter().enumerate().filter(|(i, _)| !self.consumed[*i]).map(|(i, e)| (i, *e))
    }

    fn consume(&mut self, index: usize) {
        debug_assert!(!self.consumed[index], "event consumed twice");
        self.consumed[index] = true;
    }

    fn len(&self) -> usize {
        self.events.len()
    }
}

fn onchain_pool(events: &[OnchainEvent], kind: OnchainEventKind) -> Pool<'_, OnchainEvent> {
    Pool::new(events.iter().filter(|e| e.kind == kind), |e| e.timestamp)
}

fn offchain_pool(events: &[OffchainEvent], kind: OffchainEventKind) -> Pool<'_, OffchainEvent> {
    Pool::new(events.iter().filter(|e| e.kind == kind), |e| e.timestamp)
}

fn is_eligible(candidate: &OnchainEvent, target: &OffchainEvent, window_secs: u64) -> bool {
    if candidate.user == target.address {
        return true;
    }
    let within_time = candidate.timestamp.abs_diff(target.timestamp) <= window_secs;
    let within_amount = !target.quantity.is_zero()
        && abs_diff(target.quantity, candidate.amount)
            .saturating_mul(U256::from(AMOUNT_TOLERANCE_DIVISOR))
            <= target.quantity;
    within_time && within_amount
}

/// Pick the closest eligible candidate from `(index, event)` pairs given in sorted order.
fn closest<'a>(
    candidates: impl Iterator<Item = (usize, &'a OnchainEvent)>,
    target: &OffchainEvent,
    tolerance_minutes: u64,
) -> Option<(usize, &'a OnchainEvent)> {
    let window_secs = tolerance_minutes.saturating_mul(60);
    let mut best: Option<(usize, &'a OnchainEvent, u64, U256)> = None;
    for (index, candidate) in candidates {
        if !is_eligible(candidate, target, window_secs) {
            continue;
        }
        let time_diff = candidate.timestamp.abs_diff(target.timestamp);
        let amount_diff = abs_diff(target.quantity, candidate.amount);
        let closer = match &best {
            None => true,
            Some((_, _, best_time, best_amount)) => {
                time_diff < *best_time || (time_diff == *best_time && amount_diff < *best_amount)
            }
        };
        if closer {
            best = Some((index, candidate, time_diff, amount_diff));
        }
    }
    best.map(|(index, event, _, _)| (index, event))
}

/// Find the on-chain event that best corresponds to `target`.
///
/// A candidate is eligible if its timestamp is within `tolerance_minutes` of the target and its
/// amount deviates from the target quantity by at most 10%, or unconditionally if its user equals
/// the target address. Among eligible candidates the one closest in time wins, then the one
/// closest in amount, then the earliest in `candidates` order.
pub fn find_closest_matching_event<'a>(
    candidates: impl IntoIterator<Item = &'a OnchainEvent>,
    target: &OffchainEvent,
    tolerance_minutes: u64,
) -> Option<&'a OnchainEvent> {
    closest(candidates.into_iter().enumerate(), target, tolerance_minutes).map(|(_, e)| e)
}

fn is_valid_delegation_pair(queue: &OnchainEvent, activate: &OnchainEvent) -> bool {
    queue.user == activate.user && queue.validator == activate.validator
}

/// Produce the delegations both sources agree on.
///
/// Unmatched events are not errors; they are simply absent from the output. The result is
/// deterministic for a given input, including its order.
pub fn match_delegations(
    offchain_events: &[OffchainEvent],
    onchain_events: &[OnchainEvent],
    tolerance_minutes: u64,
) -> Vec<VerifiedDelegation> {
    let mut queue_events = onchain_pool(onchain_events, OnchainEventKind::Queue);
    let mut activate_events = onchain_pool(onchain_events, OnchainEventKind::Activate);
    let cancel_events = onchain_pool(onchain_events, OnchainEventKind::Cancel);
    let offchain_queue = offchain_pool(offchain_events, OffchainEventKind::QueueBoost);
    let mut offchain_activate = offchain_pool(offchain_events, OffchainEventKind::ActivateBoost);

    tracing::debug!(
        "Matching {} off-chain queues / {} activations against {} on-chain queues / {} activations / {} cancels",
        offchain_queue.len(),
        offchain_activate.len(),
        queue_events.len(),
        activate_events.len(),
        cancel_events.len()
    );

    let mut verified = Vec::new();

    for (_, offchain_queue_event) in offchain_queue.available() {
        let Some((queue_index, onchain_queue)) =
            closest(queue_events.available(), offchain_queue_event, tolerance_minutes)
        else {
            tracing::debug!(
                "No on-chain queue for {} at {}",
                offchain_queue_event.address,
                offchain_queue_event.timestamp
            );
            continue;
        };

        if let Some((_, cancel)) =
            closest(cancel_events.available(), offchain_queue_event, tolerance_minutes)
        {
            if cancel.timestamp > onchain_queue.timestamp {
                tracing::debug!(
                    "Boost by {} queued at {} was cancelled at {}",
                    offchain_queue_event.address,
                    onchain_queue.timestamp,
                    cancel.timestamp
                );
                continue;
            }
        }

        if offchain_queue_event.quantity != onchain_queue.amount {
            tracing::debug!(
                "Amount mismatch for {}: off-chain {} vs on-chain {}",
                offchain_queue_event.address,
                offchain_queue_event.quantity,
                onchain_queue.amount
            );
            continue;
        }

        let activate_candidates: Vec<(usize, &OffchainEvent)> = offchain_activate
            .available()
            .filter(|(_, e)| e.address == offchain_queue_event.address)
            .collect();

        for (offchain_activate_index, offchain_activate_event) in activate_candidates {
            let Some((activate_index, onchain_activate)) =
                closest(activate_events.available(), offchain_activate_event, tolerance_minutes)
            else {
                continue;
            };
            if !is_valid_delegation_pair(onchain_queue, onchain_activate) {
                continue;
            }

            verified.push(VerifiedDelegation {
                user: offchain_queue_event.address,
                validator: onchain_queue.validator,
                amount: onchain_queue.amount,
                offchain_queue_timestamp: offchain_queue_event.timestamp,
                onchain_queue_timestamp: onchain_queue.timestamp,
                offchain_activate_timestamp: offchain_activate_event.timestamp,
                onchain_activate_timestamp: onchain_activate.timestamp,
            });
            offchain_activate.consume(offchain_activate_index);
            queue_events.consume(queue_index);
            activate_events.consume(activate_index);
            break;
        }
    }

    tracing::info!(
        "Verified {} of {} off-chain queued boosts",
        verified.len(),
        offchain_queue.len()
    );
    verified
}
