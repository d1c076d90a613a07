// Copyright 2022 Webb Technologies Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use std::sync::Arc;
use std::time::Duration;

use ethers::types::{Address, H256, U256};
use oracle_chain_client::DummyChainClient;
use oracle_data_source_backends::{
    DummyBehavior, DummyDataSource, FallbackResolver,
};
use oracle_relayer_context::{RelayerContext, Shutdown};
use oracle_relayer_store::{HistoryStoreKey, InMemoryStore, OutcomeCacheStore};
use oracle_relayer_types::{
    EntityRecord, Fulfillment, Request, ResolutionOutcome,
};
use oracle_relayer_utils::{Error, ValidationError};
use oracle_request_validator::EntityDirectory;
use oracle_tx_submitter::TxSubmitter;
use serde_json::json;
use tracing_test::traced_test;

use crate::*;

struct Harness {
    chain: Arc<DummyChainClient>,
    store: InMemoryStore,
    observer: Arc<RecordingObserver>,
    poller: Arc<RequestPoller<InMemoryStore>>,
}

fn entity(id: &str, name: &str, locator: &str) -> EntityRecord {
    EntityRecord {
        entity_id: id.to_owned(),
        display_name: name.to_owned(),
        data_locator: locator.to_owned(),
    }
}

fn request(id: u64, entity_id: &str, name: &str, block: u64) -> Request {
    Request {
        request_id: H256::from_low_u64_be(id),
        requester: Some(Address::repeat_byte(0x11)),
        entity_id: entity_id.to_owned(),
        entity_name: name.to_owned(),
        source_block: block,
        requested_at: None,
    }
}

fn serving(value: u64) -> DummyDataSource {
    DummyDataSource::new(
        "gateway-1",
        DummyBehavior::Serve(json!({ "creditScore": value })),
    )
}

fn harness(
    entities: Vec<EntityRecord>,
    source: DummyDataSource,
    attempt_timeout: Duration,
) -> Harness {
    let chain = Arc::new(DummyChainClient::new(0));
    let store = InMemoryStore::default();
    let observer = Arc::new(RecordingObserver::default());
    let resolver = FallbackResolver::builder()
        .attempt_timeout(attempt_timeout)
        .fallback(Box::new(source))
        .build();
    let processor = RequestProcessor::new(
        Arc::new(EntityDirectory::new(entities).unwrap()),
        Arc::new(resolver),
        TxSubmitter::new(chain.clone(), 11155111, None),
        store.clone(),
        observer.clone(),
    );
    let poller = RequestPoller::new(
        chain.clone(),
        processor,
        store.clone(),
        HistoryStoreKey::from((11155111, Address::repeat_byte(0xcc))),
        observer.clone(),
    );
    Harness {
        chain,
        store,
        observer,
        poller: Arc::new(poller),
    }
}

fn simple(source: DummyDataSource) -> Harness {
    harness(
        vec![entity("e1", "Doe", "L1")],
        source,
        Duration::from_secs(1),
    )
}

#[tokio::test]
async fn tick_at_watermark_changes_nothing() {
    let h = simple(serving(720));
    h.chain.set_height(100);
    assert_eq!(h.poller.initialize(None).await.unwrap(), 100);
    let cached = ResolutionOutcome {
        entity_id: String::from("e1"),
        value: 510,
        data_locator: String::from("L1"),
        resolved_at: 1,
        tx_hash: H256::repeat_byte(5),
    };
    h.store.put_outcome("e1", cached.clone()).unwrap();

    let outcome = h.poller.tick().await.unwrap();
    assert_eq!(outcome, TickOutcome::NoNewBlocks { height: 100 });
    assert!(h.chain.queried_ranges().is_empty());
    assert!(h.chain.estimates().is_empty());
    assert_eq!(h.poller.watermark().unwrap(), 100);
    assert_eq!(h.store.get_outcome("e1").unwrap(), Some(cached));
}

#[tokio::test]
async fn consecutive_ticks_scan_contiguous_ranges() {
    let h = simple(serving(720));
    h.chain.set_height(100);
    h.poller.initialize(None).await.unwrap();

    h.chain.set_height(110);
    assert_eq!(
        h.poller.tick().await.unwrap(),
        TickOutcome::Scanned {
            from: 101,
            to: 110,
            fulfilled: 0,
            skipped: 0
        }
    );
    assert_eq!(h.poller.watermark().unwrap(), 110);

    h.chain.set_height(115);
    h.poller.tick().await.unwrap();
    assert_eq!(h.chain.queried_ranges(), vec![(101, 110), (111, 115)]);
    assert_eq!(h.poller.watermark().unwrap(), 115);
}

#[tokio::test]
async fn watermark_never_moves_backwards() {
    let h = simple(serving(720));
    h.poller.initialize(Some(101)).await.unwrap();
    h.chain.set_height(90);
    assert_eq!(
        h.poller.tick().await.unwrap(),
        TickOutcome::NoNewBlocks { height: 90 }
    );
    assert_eq!(h.poller.watermark().unwrap(), 100);
}

#[tokio::test]
async fn query_failure_keeps_the_watermark() {
    let h = simple(serving(720));
    h.poller.initialize(Some(101)).await.unwrap();
    h.chain.set_height(110);
    h.chain.fail_queries(true);

    assert!(matches!(h.poller.tick().await, Err(Error::ChainQuery(_))));
    assert_eq!(h.poller.watermark().unwrap(), 100);
    assert!(h
        .observer
        .events()
        .iter()
        .any(|e| matches!(e, RelayEvent::TickFailed { .. })));

    h.chain.fail_queries(false);
    h.poller.tick().await.unwrap();
    assert_eq!(h.chain.queried_ranges(), vec![(101, 110)]);
    assert_eq!(h.poller.watermark().unwrap(), 110);
}

#[tokio::test]
async fn request_is_fulfilled_and_cached() {
    let h = simple(serving(720));
    h.poller.initialize(Some(1)).await.unwrap();
    h.chain.push_request(request(1, "e1", "Doe", 5));
    h.chain.set_height(10);

    assert_eq!(
        h.poller.tick().await.unwrap(),
        TickOutcome::Scanned {
            from: 1,
            to: 10,
            fulfilled: 1,
            skipped: 0
        }
    );
    let expected = Fulfillment {
        request_id: H256::from_low_u64_be(1),
        entity_id: String::from("e1"),
        value: 720,
        data_locator: String::from("L1"),
    };
    assert_eq!(
        h.chain.sent(),
        vec![(expected, U256::from(DummyChainClient::GAS_ESTIMATE))]
    );
    let cached = h.store.get_outcome("e1").unwrap().unwrap();
    assert_eq!(cached.value, 720);
    assert_eq!(cached.data_locator, "L1");
    assert_eq!(cached.tx_hash, H256::from_low_u64_be(1));
    assert_eq!(
        h.poller.processor().get_latest_outcome("e1").unwrap(),
        Some(cached)
    );
}

#[tokio::test]
#[traced_test]
async fn name_mismatch_stops_the_pipeline() {
    let source = serving(720);
    let h = harness(
        vec![entity("e1", "Smith", "L1")],
        source.clone(),
        Duration::from_secs(1),
    );
    h.poller.initialize(Some(1)).await.unwrap();
    h.chain.push_request(request(1, "e1", "Doe", 5));
    h.chain.set_height(10);

    assert_eq!(
        h.poller.tick().await.unwrap(),
        TickOutcome::Scanned {
            from: 1,
            to: 10,
            fulfilled: 0,
            skipped: 1
        }
    );
    assert_eq!(source.calls(), 0);
    assert!(h.chain.estimates().is_empty());
    assert_eq!(h.store.get_outcome("e1").unwrap(), None);
    assert_eq!(h.poller.watermark().unwrap(), 10);
    assert!(h.observer.events().iter().any(|e| matches!(
        e,
        RelayEvent::RequestSkipped {
            stage: SkipStage::Validation,
            ..
        }
    )));
    assert!(logs_contain("kind=request"));
    assert!(logs_contain("observed=true"));
    assert!(logs_contain("skipped=true stage=Validation"));
}

#[tokio::test]
async fn one_failed_request_does_not_abort_the_tick() {
    let h = simple(serving(700));
    h.poller.initialize(Some(1)).await.unwrap();
    h.chain.push_request(request(1, "nobody", "Nobody", 3));
    h.chain.push_request(request(2, "e1", "Doe", 4));
    h.chain.set_height(5);

    assert_eq!(
        h.poller.tick().await.unwrap(),
        TickOutcome::Scanned {
            from: 1,
            to: 5,
            fulfilled: 1,
            skipped: 1
        }
    );
    let sent = h.chain.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0.request_id, H256::from_low_u64_be(2));
}

#[tokio::test]
async fn submission_failure_is_not_cached() {
    let h = simple(serving(720));
    h.poller.initialize(Some(1)).await.unwrap();
    h.chain.push_request(request(1, "e1", "Doe", 2));
    h.chain.set_height(2);
    h.chain.fail_sends("insufficient funds");

    h.poller.tick().await.unwrap();
    assert_eq!(h.store.get_outcome("e1").unwrap(), None);
    assert_eq!(h.poller.watermark().unwrap(), 2);
    let events = h.observer.events();
    assert!(events
        .iter()
        .any(|e| matches!(e, RelayEvent::SubmissionFailed { .. })));
    assert!(events.iter().any(|e| matches!(
        e,
        RelayEvent::RequestSkipped {
            stage: SkipStage::Submission,
            ..
        }
    )));
}

#[tokio::test]
async fn resolution_failure_is_skipped() {
    let h = simple(DummyDataSource::new(
        "gateway-1",
        DummyBehavior::Serve(json!({ "score": 720 })),
    ));
    h.poller.initialize(Some(1)).await.unwrap();
    h.chain.push_request(request(1, "e1", "Doe", 2));
    h.chain.set_height(2);

    h.poller.tick().await.unwrap();
    assert!(h.chain.estimates().is_empty());
    assert!(h.observer.events().iter().any(|e| matches!(
        e,
        RelayEvent::RequestSkipped {
            stage: SkipStage::Resolution,
            ..
        }
    )));
}

#[tokio::test]
async fn concurrent_tick_is_rejected() {
    let h = harness(
        vec![entity("e1", "Doe", "L1")],
        DummyDataSource::new("gateway-1", DummyBehavior::Hang),
        Duration::from_millis(300),
    );
    h.poller.initialize(Some(1)).await.unwrap();
    h.chain.push_request(request(1, "e1", "Doe", 2));
    h.chain.set_height(2);

    let poller = h.poller.clone();
    let first = tokio::spawn(async move { poller.tick().await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.poller.tick().await.unwrap(), TickOutcome::Busy);

    let first = first.await.unwrap().unwrap();
    assert!(matches!(first, TickOutcome::Scanned { skipped: 1, .. }));
    // the guard is released once the tick settles.
    assert_eq!(
        h.poller.tick().await.unwrap(),
        TickOutcome::NoNewBlocks { height: 2 }
    );
}

#[tokio::test]
async fn run_stops_on_shutdown() {
    let h = simple(serving(720));
    h.poller.initialize(Some(1)).await.unwrap();
    h.chain.set_height(3);
    let (tx, rx) = tokio::sync::broadcast::channel(1);

    let poller = h.poller.clone();
    let handle = tokio::spawn(async move {
        poller.run(Duration::from_millis(10), Shutdown::new(rx)).await
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    tx.send(()).unwrap();

    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("poller did not stop")
        .unwrap()
        .unwrap();
    assert!(h.chain.height_reads() >= 2);
    assert_eq!(h.poller.watermark().unwrap(), 3);
}

#[tokio::test]
async fn manual_resolution_uses_a_fresh_request_id() {
    let h = simple(serving(650));
    let processor = h.poller.processor();

    let outcome = processor
        .trigger_manual_resolution("e1", "Doe")
        .await
        .unwrap();
    assert_eq!(outcome.value, 650);
    let sent = h.chain.sent();
    assert_eq!(sent.len(), 1);
    assert_ne!(sent[0].0.request_id, H256::zero());
    assert_eq!(h.store.get_outcome("e1").unwrap(), Some(outcome));

    let err = processor
        .trigger_manual_resolution("e1", "doe")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::NameMismatch { .. })
    ));
}

fn context(chain: Arc<DummyChainClient>, value: u64) -> RelayerContext {
    let config = serde_json::from_value(json!({
        "evm": {
            "name": "sepolia",
            "http-endpoint": "http://127.0.0.1:8545",
            "chain-id": 11155111,
            "private-key": "0x8917174396171783496173419137618235192359106130478137647163400318",
            "contract-address": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
        },
        "entities": [
            { "entity-id": "user001", "display-name": "John Doe", "data-locator": "bafy1" },
        ],
    }))
    .unwrap();
    let resolver = FallbackResolver::builder()
        .fallback(Box::new(serving(value)))
        .build();
    RelayerContext::with_backends(config, chain, resolver).unwrap()
}

#[tokio::test]
#[traced_test]
async fn builds_from_the_context() {
    let chain = Arc::new(DummyChainClient::new(20));
    let ctx = context(chain.clone(), 710);
    let observer = Arc::new(TracingObserver::new(ctx.metrics.clone()));
    let poller = RequestPoller::from_context(&ctx, observer);

    assert_eq!(poller.initialize(None).await.unwrap(), 20);
    chain.push_request(request(9, "user001", "John Doe", 21));
    chain.set_height(21);
    poller.tick().await.unwrap();

    let cached = ctx.store().get_outcome("user001").unwrap().unwrap();
    assert_eq!(cached.value, 710);
    assert_eq!(ctx.metrics.requests_fulfilled.get(), 1.0);
    assert_eq!(ctx.metrics.watermark_block.get(), 21.0);
    assert!(logs_contain("Request fulfilled"));
}

#[tokio::test]
async fn manual_resolution_waits_for_the_poller_submission() {
    let chain = Arc::new(DummyChainClient::new(20));
    chain.delay_sends(Duration::from_millis(100));
    let ctx = context(chain.clone(), 640);
    let observer = Arc::new(RecordingObserver::default());
    let poller = RequestPoller::from_context(&ctx, observer.clone());
    // built the way the http api builds it, next to the poller.
    let manual = RequestProcessor::from_context(&ctx, observer);

    poller.initialize(None).await.unwrap();
    chain.push_request(request(9, "user001", "John Doe", 21));
    chain.set_height(21);

    let (tick, outcome) = tokio::join!(
        poller.tick(),
        manual.trigger_manual_resolution("user001", "John Doe"),
    );
    assert!(matches!(tick.unwrap(), TickOutcome::Scanned { fulfilled: 1, .. }));
    assert_eq!(outcome.unwrap().value, 640);
    assert_eq!(chain.sent().len(), 2);
    assert_eq!(chain.max_sends_in_flight(), 1);
}
