//! HTTP surface tests, driving the router in-process.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use usagewatch_gateway::{
    app_state::AppState, config, router::build_router, usage::UsageSnapshotter,
};

fn state(yaml: &str) -> AppState {
    AppState::new(config::load_from_str(yaml).unwrap()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = to_bytes(resp.into_body(), 1 << 20).await.unwrap();
    (status, body.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(app, Request::get(uri).body(Body::empty()).unwrap()).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_call(app: &Router, body: Value) -> (StatusCode, Value) {
    let req = Request::post("/v1/calls")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, body) = send(app, req).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn idle_usage_is_all_zero_with_four_keys() {
    let app = build_router(state("version: 1\n"));
    let (status, v) = get_json(&app, "/usage").await;

    assert_eq!(status, StatusCode::OK);
    let obj = v.as_object().unwrap();
    assert_eq!(obj.len(), 4);
    assert_eq!(obj["geminiCalls"], 0);
    assert_eq!(obj["activeUsers"], 0);
    assert_eq!(obj["pendingBatches"], 0);
    DateTime::parse_from_rfc3339(obj["timestamp"].as_str().unwrap()).unwrap();
}

#[tokio::test]
async fn usage_reflects_collaborator_state() {
    let st = state("version: 1\n");
    st.calls().record(42).unwrap();
    for u in ["a", "b", "c"] {
        assert!(st.limits().check(u));
    }
    for i in 0..7 {
        st.batches()
            .push(usagewatch_gateway::usage::BatchItem::new("a", json!(i)))
            .unwrap();
    }

    let app = build_router(st.clone());
    let (_, v) = get_json(&app, "/usage").await;
    assert_eq!(v["geminiCalls"], 42);
    assert_eq!(v["activeUsers"], 3);
    assert_eq!(v["pendingBatches"], 7);

    // reading did not change anything
    let (_, again) = get_json(&app, "/usage").await;
    assert_eq!(again["geminiCalls"], 42);
    assert_eq!(again["activeUsers"], 3);
    assert_eq!(again["pendingBatches"], 7);
    assert_eq!(st.batches().len().unwrap(), 7);
}

#[tokio::test]
async fn sequential_timestamps_do_not_decrease() {
    let app = build_router(state("version: 1\n"));
    let (_, first) = get_json(&app, "/usage").await;
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    let (_, second) = get_json(&app, "/usage").await;

    let t1: DateTime<Utc> = first["timestamp"].as_str().unwrap().parse().unwrap();
    let t2: DateTime<Utc> = second["timestamp"].as_str().unwrap().parse().unwrap();
    assert!(t2 >= t1);
}

#[tokio::test]
async fn ingest_queues_and_counts_user() {
    let app = build_router(state("version: 1\n"));
    let (status, ack) = post_call(&app, json!({"user": "u-1", "payload": {"prompt": "hi"}})).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(ack, json!({"queued": true, "pending": 1}));

    let (_, v) = get_json(&app, "/usage").await;
    assert_eq!(v["activeUsers"], 1);
    assert_eq!(v["pendingBatches"], 1);
    assert_eq!(v["geminiCalls"], 0);
}

#[tokio::test]
async fn ingest_rate_limits_per_user() {
    let app = build_router(state("version: 1\nrate_limit: { rps: 1, burst: 2 }\n"));
    for _ in 0..2 {
        let (status, _) = post_call(&app, json!({"user": "u"})).await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }
    let (status, err) = post_call(&app, json!({"user": "u"})).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(err["error"], "RATE_LIMITED");

    let (status, _) = post_call(&app, json!({"user": "other"})).await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

#[tokio::test]
async fn ingest_rejects_when_queue_full() {
    let app = build_router(state(
        "version: 1\nrate_limit: { burst: 100 }\nbatch: { max_batch_size: 2, max_pending: 2 }\n",
    ));
    post_call(&app, json!({"user": "u"})).await;
    post_call(&app, json!({"user": "u"})).await;
    let (status, err) = post_call(&app, json!({"user": "u"})).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(err["error"], "QUEUE_FULL");
}

#[tokio::test]
async fn ingest_bad_bodies_are_400() {
    let app = build_router(state("version: 1\n"));
    let (status, err) = post_call(&app, json!({"user": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "BAD_REQUEST");

    let (status, _) = post_call(&app, json!({"nope": 1})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ops_endpoints() {
    let st = state("version: 1\n");
    st.calls().record(5).unwrap();
    let app = build_router(st.clone());

    let (status, body) = send(&app, Request::get("/healthz").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");

    let (status, _) = send(&app, Request::get("/readyz").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Request::get("/metrics").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("usagewatch_gemini_calls_window 5"));
    assert!(text.contains("usagewatch_gemini_calls_lifetime 5"));
    assert!(text.contains("usagewatch_active_users 0"));

    st.set_draining();
    let (status, body) = send(&app, Request::get("/readyz").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, b"draining");
}

#[tokio::test]
async fn unwired_source_is_500_state_unavailable() {
    let cfg = config::load_from_str("version: 1\n").unwrap();
    let st = AppState::with_snapshotter(cfg, UsageSnapshotter::default()).unwrap();
    let app = build_router(st.clone());

    let (status, v) = get_json(&app, "/usage").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(v["error"], "STATE_UNAVAILABLE");
    assert_eq!(v["message"], "state unavailable: call_counter");
    assert_eq!(st.metrics().snapshot_failures.get(&[("trigger", "http")]), 1);

    let (status, _) = send(&app, Request::get("/readyz").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn metrics_scrapes_do_not_advance_usage_clock() {
    let st = state("version: 1\n");
    for _ in 0..5000 {
        st.metrics_extra();
    }
    let app = build_router(st);
    let (_, v) = get_json(&app, "/usage").await;

    let stamp: DateTime<Utc> = v["timestamp"].as_str().unwrap().parse().unwrap();
    let lead = stamp - Utc::now();
    assert!(lead <= chrono::Duration::milliseconds(5), "stamp ahead by {lead}");
}
