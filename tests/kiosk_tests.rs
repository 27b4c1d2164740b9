// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end kiosk scan: parse, validate, store and relay in one call.

use axum::http::StatusCode;
use tower::ServiceExt;

mod common;

use common::{body_json, post_json};

const BADGE: &str = "1234567890,Asha Rao,+91 98765 43210,asha@school.example";

fn scan_body(payload: &str) -> serde_json::Value {
    serde_json::json!({ "payload": payload })
}

#[tokio::test]
async fn test_scan_stores_and_checks_in() {
    let (app, state, crm) = common::create_test_app();

    let response = app
        .oneshot(post_json("/api/kiosk/scan", &scan_body(BADGE)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["isUpdate"], false);
    assert!(json["submissionId"].as_str().unwrap().starts_with("SUB_"));
    assert_eq!(json["data"]["id"], "1234567890");
    assert_eq!(json["data"]["source"], "qr_scan");
    assert_eq!(json["checkIn"]["success"], true);
    assert!(json["checkIn"]["checkInId"]
        .as_str()
        .unwrap()
        .starts_with("CHECKIN_"));

    assert_eq!(state.pipeline.store().count().await.unwrap(), 1);
    assert!(crm.is_checked_in(&state.config.crm_deal_id));
}

#[tokio::test]
async fn test_rescan_is_update() {
    let (app, state, crm) = common::create_test_app();

    for expected_update in [false, true] {
        let response = app
            .clone()
            .oneshot(post_json("/api/kiosk/scan", &scan_body(BADGE)))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["isUpdate"], expected_update);
    }

    assert_eq!(state.pipeline.store().count().await.unwrap(), 1);
    assert_eq!(crm.deal_calls(), 2);
}

#[tokio::test]
async fn test_relay_failure_keeps_submission() {
    let (app, state, crm) = common::create_test_app();
    crm.fail_deal(500, "INTERNAL_ERROR");

    let response = app
        .oneshot(post_json("/api/kiosk/scan", &scan_body(BADGE)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["checkIn"]["success"], false);
    assert_eq!(json["checkIn"]["failedStep"], "deal update");
    assert_eq!(
        json["checkIn"]["error"],
        "Deal update failed: 500 - INTERNAL_ERROR"
    );
    assert!(json["checkIn"].get("checkInId").is_none());

    assert_eq!(state.pipeline.store().count().await.unwrap(), 1);
    // The deal update is never retried.
    assert_eq!(crm.deal_calls(), 1);
}

#[tokio::test]
async fn test_unparseable_payload_touches_nothing() {
    let (app, state, crm) = common::create_test_app();

    let response = app
        .oneshot(post_json("/api/kiosk/scan", &scan_body("hello world")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid QR code format");
    assert_eq!(state.pipeline.store().count().await.unwrap(), 0);
    assert_eq!(crm.token_calls(), 0);
}

#[tokio::test]
async fn test_invalid_badge_touches_nothing() {
    let (app, state, crm) = common::create_test_app();

    let response = app
        .oneshot(post_json(
            "/api/kiosk/scan",
            &scan_body("1234567890,Asha Rao,+91 98765 43210,not-an-email"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid email format");
    assert_eq!(state.pipeline.store().count().await.unwrap(), 0);
    assert_eq!(crm.token_calls(), 0);
}

#[tokio::test]
async fn test_source_is_recorded() {
    let (app, state, _crm) = common::create_test_app();

    app.oneshot(post_json(
        "/api/kiosk/scan",
        &serde_json::json!({ "payload": BADGE, "source": "front_desk" }),
    ))
    .await
    .unwrap();

    let stored = state
        .pipeline
        .store()
        .get("1234567890")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.source, "front_desk");
}
