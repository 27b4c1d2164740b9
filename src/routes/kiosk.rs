// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One-call kiosk scan: record the badge and check it in.

use crate::error::Result;
use crate::models::Submission;
use crate::time_utils::millis_id;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Kiosk routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/kiosk/scan", post(scan))
}

#[derive(Deserialize)]
struct ScanRequest {
    payload: String,
    #[serde(default)]
    source: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct CheckInStatus {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_id: Option<String>,
    /// Step that was pending when the relay failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub success: bool,
    pub is_update: bool,
    pub submission_id: String,
    pub data: Submission,
    pub check_in: CheckInStatus,
}

/// Parse, validate, store and relay a scanned payload.
///
/// A relay failure is reported in `checkIn` and does not undo the stored
/// submission.
async fn scan(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanResponse>> {
    let Json(request) = body?;
    let source = request.source.as_deref().unwrap_or("qr_scan");

    let cancel = state.shutdown.child_token();
    let result = state
        .pipeline
        .process_payload(&request.payload, source, &cancel)
        .await?;

    let now = chrono::Utc::now();
    let is_update = result.recorded.outcome.is_update();

    let check_in = match result.check_in {
        Ok(_) => CheckInStatus {
            success: true,
            check_in_id: Some(millis_id("CHECKIN", now)),
            failed_step: None,
            error: None,
        },
        Err(e) => CheckInStatus {
            success: false,
            check_in_id: None,
            failed_step: Some(e.step().to_string()),
            error: Some(e.to_string()),
        },
    };

    Ok(Json(ScanResponse {
        success: true,
        is_update,
        submission_id: millis_id(if is_update { "UPD" } else { "SUB" }, now),
        data: result.submission,
        check_in,
    }))
}
