//! Stop sequence: readiness flips before the listener goes away.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use tokio::sync::oneshot;
use tower::ServiceExt;
use usagewatch_gateway::{app_state::AppState, config, router::build_router, shutdown};

async fn readyz(st: &AppState) -> (StatusCode, Vec<u8>) {
    let resp = build_router(st.clone())
        .oneshot(Request::get("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    (status, to_bytes(resp.into_body(), 1024).await.unwrap().to_vec())
}

#[tokio::test]
async fn draining_is_visible_during_pre_stop_delay() {
    let st = AppState::new(config::load_from_str("version: 1\n").unwrap()).unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let stop = tokio::spawn(shutdown::drain_on(
        st.clone(),
        async move {
            let _ = rx.await;
        },
        Duration::from_millis(400),
    ));

    assert_eq!(readyz(&st).await.0, StatusCode::OK);

    tx.send(()).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let (status, body) = readyz(&st).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, b"draining");
    assert!(!stop.is_finished(), "server must keep serving while draining");

    tokio::time::timeout(Duration::from_secs(1), stop)
        .await
        .expect("drain delay elapsed")
        .unwrap();
}
