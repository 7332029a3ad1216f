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

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use alloy::primitives::{address, Address, U256};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use boost_indexer::{
    check_delegation,
    distributions::{DistributionsClient, RewardSource},
    graphql::GraphQlClient,
    offchain::{OffchainClient, OffchainSource},
    onchain::{OnchainClient, OnchainSource},
    CheckOptions, FetchError,
};
use boost_rewards::{OffchainEventKind, OnchainEventKind, TimeWindow, TimestampUnit};
use serde_json::{json, Value};
use url::Url;

const USER_A: Address = address!("0x00000000000000000000000000000000000000aa");
const USER_B: Address = address!("0x00000000000000000000000000000000000000bb");
const VALIDATOR: Address = address!("0x0000000000000000000000000000000000000011");

/// In-process stand-in for both GraphQL indexers.
#[derive(Default)]
struct MockIndexer {
    /// Pages of attestation nodes; page `n` is served for cursor `cursor-{n}`.
    attestation_pages: Vec<Vec<Value>>,
    /// Contract events per entity name.
    boost_events: HashMap<&'static str, Vec<Value>>,
    distributions: Vec<Value>,
    /// Respond with HTTP 500 to attestation page requests from this index on.
    fail_attestations_from: Option<usize>,
    /// Respond with a GraphQL error to event requests at or beyond this offset.
    fail_events_from_offset: Option<u64>,
    requests: Mutex<Vec<Value>>,
}

impl MockIndexer {
    fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    fn attestations(&self, variables: &Value) -> Result<Value, StatusCode> {
        let index = match variables["after"].as_str() {
            None => 0,
            Some(cursor) => cursor.trim_start_matches("cursor-").parse::<usize>().unwrap() + 1,
        };
        if self.fail_attestations_from.is_some_and(|from| index >= from) {
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
        let edges: Vec<Value> = self.attestation_pages[index]
            .iter()
            .map(|node| json!({"node": node, "cursor": format!("cursor-{index}")}))
            .collect();
        let has_next_page = index + 1 < self.attestation_pages.len();
        Ok(json!({"data": {"transactions": {"edges": edges, "pageInfo": {"hasNextPage": has_next_page}}}}))
    }

    fn events(&self, query: &str, variables: &Value) -> Value {
        let offset = variables["offset"].as_u64().unwrap();
        let limit = variables["limit"].as_u64().unwrap() as usize;
        if self.fail_events_from_offset.is_some_and(|from| offset >= from) {
            return json!({"data": null, "errors": [{"message": "indexer unavailable"}]});
        }
        let entity = ["queueBoosts", "activateBoosts", "cancelBoosts", "dropBoosts"]
            .into_iter()
            .find(|entity| query.contains(&format!("{entity}(")))
            .unwrap();
        let events = self.boost_events.get(entity).cloned().unwrap_or_default();
        let page: Vec<Value> = events.into_iter().skip(offset as usize).take(limit).collect();
        let mut data = serde_json::Map::new();
        data.insert(entity.to_string(), Value::Array(page));
        json!({ "data": data })
    }
}

async fn graphql(
    State(mock): State<Arc<MockIndexer>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    mock.requests.lock().unwrap().push(body.clone());
    let query = body["query"].as_str().unwrap_or_default();
    let variables = &body["variables"];
    let response = if query.contains("transactions(") {
        mock.attestations(variables)?
    } else if query.contains("distributions(") {
        json!({"data": {"distributions": mock.distributions}})
    } else {
        mock.events(query, variables)
    };
    Ok(Json(response))
}

async fn serve(mock: MockIndexer) -> (Url, Arc<MockIndexer>) {
    let mock = Arc::new(mock);
    let app = Router::new().route("/graphql", post(graphql)).with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (Url::parse(&format!("http://{addr}/graphql")).unwrap(), mock)
}

fn attestation(kind: OffchainEventKind, user: Address, timestamp: u64, quantity: u64) -> Value {
    json!({
        "id": format!("{}-{user}-{timestamp}", kind.tag()),
        "tags": [
            {"name": "event", "value": kind.tag()},
            {"name": "referrer", "value": "ref"},
            {"name": "address", "value": user.to_string()},
            {"name": "timestamp", "value": timestamp.to_string()},
            {"name": "quantity", "value": quantity.to_string()},
        ]
    })
}

fn boost_event(user: Address, amount: u64, timestamp: u64) -> Value {
    json!({
        "user": user.to_string(),
        "validator": VALIDATOR.to_string(),
        "amount": amount.to_string(),
        "timestamp": timestamp.to_string(),
    })
}

fn offchain_client(url: Url) -> OffchainClient {
    OffchainClient::new(GraphQlClient::new(url), "owner").with_page_size(2)
}

#[test_log::test(tokio::test)]
async fn attestations_follow_cursors() {
    let (url, mock) = serve(MockIndexer {
        attestation_pages: vec![
            vec![
                attestation(OffchainEventKind::QueueBoost, USER_A, 1_000, 100),
                attestation(OffchainEventKind::ActivateBoost, USER_A, 1_100, 100),
            ],
            vec![
                attestation(OffchainEventKind::QueueBoost, USER_B, 2_000, 50),
                json!({"id": "no-address", "tags": [{"name": "event", "value": "queue_boost"}]}),
            ],
            vec![attestation(OffchainEventKind::ActivateBoost, USER_B, 2_100, 50)],
        ],
        ..Default::default()
    })
    .await;

    let outcome =
        offchain_client(url).boost_attestations("ref", &TimeWindow::default()).await;
    assert!(outcome.is_complete());
    assert_eq!(outcome.pages, 3);
    let events = outcome.into_complete().unwrap();
    assert_eq!(events.len(), 4);
    assert_eq!(events[2].address, USER_B);
    assert_eq!(events[2].quantity, U256::from(50u64));

    let requests = mock.requests();
    let afters: Vec<_> = requests.iter().map(|r| r["variables"]["after"].clone()).collect();
    assert_eq!(afters, vec![Value::Null, json!("cursor-0"), json!("cursor-1")]);
    assert_eq!(requests[0]["variables"]["owners"], json!(["owner"]));
    assert_eq!(
        requests[0]["variables"]["tags"],
        json!([
            {"name": "event", "values": ["queue_boost", "activate_boost"]},
            {"name": "referrer", "values": ["ref"]}
        ])
    );
    assert_eq!(requests[0]["variables"]["first"], 2);
}

#[test_log::test(tokio::test)]
async fn attestation_timestamps_are_converted_before_windowing() {
    let (url, _mock) = serve(MockIndexer {
        attestation_pages: vec![vec![
            attestation(OffchainEventKind::QueueBoost, USER_A, 1_000_999, 100),
            attestation(OffchainEventKind::QueueBoost, USER_B, 5_000_000, 100),
        ]],
        ..Default::default()
    })
    .await;

    let client = offchain_client(url).with_timestamp_unit(TimestampUnit::Milliseconds);
    let events = client
        .boost_attestations("ref", &TimeWindow::new(Some(1_000), Some(2_000)))
        .await
        .into_complete()
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].timestamp, 1_000);
}

#[test_log::test(tokio::test)]
async fn attestation_failure_keeps_earlier_pages() {
    let (url, _mock) = serve(MockIndexer {
        attestation_pages: vec![
            vec![attestation(OffchainEventKind::QueueBoost, USER_A, 1_000, 100)],
            vec![attestation(OffchainEventKind::QueueBoost, USER_B, 2_000, 100)],
        ],
        fail_attestations_from: Some(1),
        ..Default::default()
    })
    .await;

    let outcome =
        offchain_client(url).boost_attestations("ref", &TimeWindow::default()).await;
    assert!(matches!(outcome.interruption, Some(FetchError::Http(_))));
    assert_eq!(outcome.pages, 1);
    assert_eq!(outcome.records.len(), 1);

    let err = outcome.resolve("attestations", false).unwrap_err();
    assert!(format!("{err:#}").contains("fetching attestations failed after 1 pages"));
}

#[test_log::test(tokio::test)]
async fn boost_events_page_by_offset_per_kind() {
    let queued: Vec<Value> = (0..5).map(|i| boost_event(USER_A, 100 + i, 1_000 + i)).collect();
    let (url, mock) = serve(MockIndexer {
        boost_events: HashMap::from([
            ("queueBoosts", queued),
            ("activateBoosts", vec![boost_event(USER_A, 100, 1_600)]),
            ("cancelBoosts", vec![json!({"user": "bogus", "validator": "0x", "amount": "1", "timestamp": "1"})]),
        ]),
        ..Default::default()
    })
    .await;

    let client = OnchainClient::new(GraphQlClient::new(url)).with_page_size(2);
    let outcome = client.boost_events(&TimeWindow::new(Some(10), Some(5_000))).await;
    assert!(outcome.is_complete());
    // 3 queue pages, then one short page for each other kind.
    assert_eq!(outcome.pages, 6);
    let events = outcome.into_complete().unwrap();
    let queued = events.iter().filter(|e| e.kind == OnchainEventKind::Queue).count();
    let activated = events.iter().filter(|e| e.kind == OnchainEventKind::Activate).count();
    assert_eq!((queued, activated, events.len()), (5, 1, 6));

    let requests = mock.requests();
    assert!(requests.iter().all(|r| r["variables"]["startTimestamp"] == "10"
        && r["variables"]["endTimestamp"] == "5000"));
    let mut queue_offsets: Vec<u64> = requests
        .iter()
        .filter(|r| r["query"].as_str().unwrap().contains("queueBoosts("))
        .map(|r| r["variables"]["offset"].as_u64().unwrap())
        .collect();
    queue_offsets.sort();
    assert_eq!(queue_offsets, vec![0, 2, 4]);
}

#[test_log::test(tokio::test)]
async fn boost_event_errors_interrupt_pagination() {
    let queued: Vec<Value> = (0..4).map(|i| boost_event(USER_A, 100, 1_000 + i)).collect();
    let (url, _mock) = serve(MockIndexer {
        boost_events: HashMap::from([("queueBoosts", queued)]),
        fail_events_from_offset: Some(2),
        ..Default::default()
    })
    .await;

    let client = OnchainClient::new(GraphQlClient::new(url)).with_page_size(2);
    let outcome = client.boost_events(&TimeWindow::new(Some(0), Some(5_000))).await;
    assert!(matches!(&outcome.interruption, Some(FetchError::GraphQl(msg)) if msg == "indexer unavailable"));
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.resolve("boost events", true).unwrap().len(), 2);
}

#[test_log::test(tokio::test)]
async fn distributions_are_summed_for_the_receiver() {
    let (url, mock) = serve(MockIndexer {
        distributions: vec![
            json!({"blockNumber": "100", "amount": "0", "rewards": [
                {"token": "BGT", "amount": "1000"}, {"token": "Honey", "amount": "30"}
            ]}),
            json!({"blockNumber": "150", "amount": "0", "rewards": [
                {"token": "bgt", "amount": "500"}, {"token": "other", "amount": "7"}
            ]}),
        ],
        ..Default::default()
    })
    .await;

    let client = DistributionsClient::new(GraphQlClient::new(url), "0xoperator");
    let totals = client.reward_totals(100, 200).await.unwrap();
    assert_eq!(totals.bgt, U256::from(1_500u64));
    assert_eq!(totals.honey, U256::from(30u64));
    assert_eq!((totals.block_start, totals.block_end), (100, 200));

    let requests = mock.requests();
    assert_eq!(
        requests[0]["variables"],
        json!({"startBlock": "100", "endBlock": "200", "receiver": "0xoperator"})
    );
    assert!(requests[0]["query"].as_str().unwrap().contains("receiver: $receiver"));
}

#[test_log::test(tokio::test)]
async fn check_delegation_against_mock_indexers() {
    let (url, _mock) = serve(MockIndexer {
        attestation_pages: vec![vec![
            attestation(OffchainEventKind::QueueBoost, USER_A, 1_000, 100),
            attestation(OffchainEventKind::ActivateBoost, USER_A, 1_500, 100),
            attestation(OffchainEventKind::QueueBoost, USER_B, 1_000, 70),
        ]],
        boost_events: HashMap::from([
            ("queueBoosts", vec![boost_event(USER_A, 100, 1_060), boost_event(USER_B, 70, 1_010)]),
            ("activateBoosts", vec![boost_event(USER_A, 100, 1_560)]),
        ]),
        ..Default::default()
    })
    .await;

    let offchain = OffchainClient::new(GraphQlClient::new(url.clone()), "owner");
    let onchain = OnchainClient::new(GraphQlClient::new(url));
    let check = check_delegation(&offchain, &onchain, "ref", &CheckOptions::default())
        .await
        .unwrap();

    assert_eq!(check.verified_delegations.len(), 1);
    let delegation = &check.verified_delegations[0];
    assert_eq!(delegation.user, USER_A);
    assert_eq!(delegation.validator, VALIDATOR);
    assert_eq!(delegation.onchain_activate_timestamp, 1_560);
    assert_eq!(check.summary.total_delegations, 1);
    assert_eq!(check.summary.unique_delegators, 1);
}
