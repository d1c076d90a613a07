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

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use ethers::types::H256;
use oracle_chain_client::DummyChainClient;
use oracle_data_source_backends::{
    DummyBehavior, DummyDataSource, FallbackResolver,
};
use oracle_relayer_context::RelayerContext;
use oracle_relayer_store::{HistoryStore, OutcomeCacheStore};
use oracle_relayer_types::ResolutionOutcome;
use oracle_relayer_utils::SourceFailure;
use serde_json::{json, Value};
use tower::ServiceExt;

fn config() -> oracle_relayer_config::OracleRelayerConfig {
    serde_json::from_value(json!({
        "evm": {
            "name": "sepolia",
            "http-endpoint": "http://127.0.0.1:8545",
            "chain-id": 11155111,
            "private-key": "0x8917174396171783496173419137618235192359106130478137647163400318",
            "contract-address": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
        },
        "entities": [
            { "entity-id": "user001", "display-name": "John Doe", "data-locator": "bafy1" },
            { "entity-id": "user002", "display-name": "Jane Smith", "data-locator": "bafy2" },
        ],
    }))
    .unwrap()
}

fn context(behavior: DummyBehavior) -> (Arc<RelayerContext>, Arc<DummyChainClient>) {
    let chain = Arc::new(DummyChainClient::new(10));
    let resolver = FallbackResolver::builder()
        .fallback(Box::new(DummyDataSource::new("down", DummyBehavior::Fail(
            SourceFailure::Status(502),
        ))))
        .fallback(Box::new(DummyDataSource::new("up", behavior)))
        .build();
    let ctx =
        RelayerContext::with_backends(config(), chain.clone(), resolver)
            .unwrap();
    (Arc::new(ctx), chain)
}

fn serving() -> DummyBehavior {
    DummyBehavior::Serve(json!({ "creditScore": 720 }))
}

fn app(ctx: Arc<RelayerContext>) -> Router {
    Router::new()
        .route("/", get(crate::routes::handle_relayer_info))
        .nest("/api/v1", crate::api_router())
        .with_state(ctx)
}

async fn call(
    ctx: Arc<RelayerContext>,
    request: Request<Body>,
) -> (StatusCode, Value) {
    let response = app(ctx).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_json(ctx: Arc<RelayerContext>, uri: &str) -> (StatusCode, Value) {
    call(ctx, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(
    ctx: Arc<RelayerContext>,
    uri: &str,
    body: Value,
) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    call(ctx, request).await
}

#[tokio::test]
async fn info_reports_the_relayer_state() {
    let (ctx, _) = context(serving());
    ctx.store()
        .set_last_block_number(ctx.history_store_key(), 7)
        .unwrap();
    let (status, body) = get_json(ctx, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["network"], "sepolia");
    assert_eq!(body["lastCheckedBlock"], 7);
    assert_eq!(body["pollingInterval"], 5000);
    assert_eq!(body["entities"], json!(["user001", "user002"]));
}

#[tokio::test]
async fn config_never_leaks_secrets() {
    let (ctx, _) = context(serving());
    let (status, body) = get_json(ctx, "/api/v1/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["chainId"], 11155111);
    assert_eq!(body["name"], "sepolia");
    assert_eq!(body["account"], format!("{:?}", ethers::types::Address::repeat_byte(0xaa)));
    assert!(body.get("private-key").is_none());
    assert!(body.get("http-endpoint").is_none());
}

#[tokio::test]
async fn entities_are_listed_in_order() {
    let (ctx, _) = context(serving());
    let (status, body) = get_json(ctx, "/api/v1/entities").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["entityId"], "user001");
    assert_eq!(body[1]["displayName"], "Jane Smith");
}

#[tokio::test]
async fn last_score_is_not_found_before_any_outcome() {
    let (ctx, _) = context(serving());
    let (status, body) =
        get_json(ctx.clone(), "/api/v1/last-score/user001").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No score yet for this user");

    ctx.store()
        .put_outcome(
            "user001",
            ResolutionOutcome {
                entity_id: String::from("user001"),
                value: 650,
                data_locator: String::from("bafy1"),
                resolved_at: 1,
                tx_hash: H256::repeat_byte(3),
            },
        )
        .unwrap();
    let (status, body) = get_json(ctx, "/api/v1/last-score/user001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"], 650);
}

#[tokio::test]
async fn resolve_test_reports_the_fallback_path() {
    let (ctx, chain) = context(serving());
    let (status, body) =
        get_json(ctx, "/api/v1/resolve-test/user001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"], 720);
    assert_eq!(body["source"], "up");
    assert_eq!(body["failedAttempts"].as_array().unwrap().len(), 1);
    // nothing goes on chain.
    assert!(chain.sent().is_empty());
}

#[tokio::test]
async fn resolve_test_of_unknown_entity_is_not_found() {
    let (ctx, _) = context(serving());
    let (status, _) = get_json(ctx, "/api/v1/resolve-test/user404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn resolve_test_failure_is_a_server_error() {
    let (ctx, _) =
        context(DummyBehavior::Fail(SourceFailure::Timeout));
    let (status, body) =
        get_json(ctx, "/api/v1/resolve-test/user001").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("All sources unavailable"));
}

#[tokio::test]
async fn manual_resolution_fulfills_and_caches() {
    let (ctx, chain) = context(serving());
    let (status, body) = post_json(
        ctx.clone(),
        "/api/v1/test-manual",
        json!({ "userId": "user002", "userName": "Jane Smith" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entityId"], "user002");
    assert_eq!(body["value"], 720);
    assert_eq!(chain.sent().len(), 1);

    let (status, body) = get_json(ctx, "/api/v1/last-score/user002").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dataLocator"], "bafy2");
}

#[tokio::test]
async fn manual_resolution_requires_both_fields() {
    let (ctx, chain) = context(serving());
    let (status, body) = post_json(
        ctx.clone(),
        "/api/v1/test-manual",
        json!({ "userId": "user002" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "userId and userName required");

    let (status, _) = post_json(
        ctx,
        "/api/v1/test-manual",
        json!({ "userId": "", "userName": "Jane Smith" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(chain.sent().is_empty());
}

#[tokio::test]
async fn manual_resolution_surfaces_validation_errors() {
    let (ctx, chain) = context(serving());
    let (status, _) = post_json(
        ctx.clone(),
        "/api/v1/test-manual",
        json!({ "userId": "user404", "userName": "Nobody" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = post_json(
        ctx,
        "/api/v1/test-manual",
        json!({ "userId": "user001", "userName": "john doe" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("Name mismatch"));
    assert!(chain.sent().is_empty());
}

#[tokio::test]
async fn metrics_are_rendered() {
    let (ctx, _) = context(serving());
    ctx.metrics.requests_observed.inc();
    let (status, body) = get_json(ctx, "/api/v1/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["metrics"]
        .as_str()
        .unwrap()
        .contains("requests_observed 1"));
}
