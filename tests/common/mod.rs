// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use kiosk_checkin::config::Config;
use kiosk_checkin::db::MemoryStore;
use kiosk_checkin::routes::create_router;
use kiosk_checkin::scanner::QrDecoder;
use kiosk_checkin::services::{
    AccessToken, CheckInRelay, CrmApi, CrmError, RetryPolicy, SubmissionPipeline,
};
use kiosk_checkin::AppState;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// In-process CRM double.
///
/// Counts calls and remembers which deals have been flagged so repeated
/// check-ins can be observed.
#[derive(Default)]
pub struct FakeCrm {
    pub token_calls: AtomicUsize,
    pub deal_calls: AtomicUsize,
    /// Status returned by the token endpoint (None = success).
    pub token_status: Mutex<Option<(u16, String)>>,
    /// Status returned by the deal endpoint (None = success).
    pub deal_status: Mutex<Option<(u16, String)>>,
    pub checked_in: Mutex<HashSet<String>>,
}

#[allow(dead_code)]
impl FakeCrm {
    pub fn fail_token(&self, status: u16, body: &str) {
        *self.token_status.lock().unwrap() = Some((status, body.to_string()));
    }

    pub fn fail_deal(&self, status: u16, body: &str) {
        *self.deal_status.lock().unwrap() = Some((status, body.to_string()));
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn deal_calls(&self) -> usize {
        self.deal_calls.load(Ordering::SeqCst)
    }

    pub fn is_checked_in(&self, deal_id: &str) -> bool {
        self.checked_in.lock().unwrap().contains(deal_id)
    }
}

#[async_trait]
impl CrmApi for FakeCrm {
    async fn exchange_refresh_token(&self) -> Result<AccessToken, CrmError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        if let Some((status, body)) = self.token_status.lock().unwrap().clone() {
            return Err(CrmError::Status { status, body });
        }
        Ok(AccessToken::new("fake-access-token"))
    }

    async fn update_deal(
        &self,
        token: &AccessToken,
        deal_id: &str,
    ) -> Result<serde_json::Value, CrmError> {
        self.deal_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(token.as_str(), "fake-access-token");
        if let Some((status, body)) = self.deal_status.lock().unwrap().clone() {
            return Err(CrmError::Status { status, body });
        }
        self.checked_in.lock().unwrap().insert(deal_id.to_string());
        Ok(serde_json::json!({
            "data": [{
                "code": "SUCCESS",
                "details": { "id": deal_id },
                "message": "record updated",
                "status": "success"
            }]
        }))
    }
}

/// Create a test app backed by the in-memory store and a fake CRM.
/// Returns the router, the shared state and the CRM double.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<FakeCrm>) {
    let config = Config::test_default();
    let crm = Arc::new(FakeCrm::default());

    let relay = CheckInRelay::new(
        crm.clone(),
        config.crm_deal_id.clone(),
        RetryPolicy::new(config.token_retry_attempts, Duration::ZERO),
    );
    let pipeline = SubmissionPipeline::new(Arc::new(MemoryStore::new()), relay);

    let state = Arc::new(AppState {
        config,
        pipeline,
        decoder: Arc::new(QrDecoder),
        shutdown: CancellationToken::new(),
    });

    (create_router(state.clone()), state, crm)
}

/// Build a JSON POST request.
#[allow(dead_code)]
pub fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a POST request with a raw body.
#[allow(dead_code)]
pub fn post_raw(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a GET request.
#[allow(dead_code)]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// A submission body that passes every field rule.
#[allow(dead_code)]
pub fn valid_submission(id: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "phone": "+91 98765 43210",
        "email": "student@example.com",
        "timestamp": "2026-01-15T09:30:00.000Z",
        "source": "qr_scan"
    })
}
