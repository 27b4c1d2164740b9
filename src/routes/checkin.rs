// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CRM check-in relay routes.

use crate::error::{AppError, Result};
use crate::models::StudentData;
use crate::time_utils::{format_utc_rfc3339, millis_id};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Check-in routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/zoho-checkin", get(api_info).post(check_in))
}

/// Check-in request from the kiosk page.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckInRequest {
    #[serde(default)]
    student_data: Option<StudentData>,
    #[serde(default)]
    timestamp: Option<String>,
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
pub struct CheckInData {
    pub student: StudentData,
    pub timestamp: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub zoho_response: serde_json::Value,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    pub success: bool,
    pub message: String,
    pub data: CheckInData,
    pub check_in_id: String,
}

/// Relay a check-in to the CRM: fresh token, then deal update.
async fn check_in(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<CheckInRequest>, JsonRejection>,
) -> Result<Json<CheckInResponse>> {
    let Json(request) = body?;

    let student = match request.student_data {
        Some(student) if !student.id.is_empty() && !student.name.is_empty() => student,
        _ => {
            return Err(AppError::validation(
                "Invalid student data",
                "Student ID and name are required",
            ))
        }
    };

    tracing::info!(
        student_id = %student.id,
        source = request.source.as_deref().unwrap_or("unknown"),
        "Processing check-in"
    );

    let cancel = state.shutdown.child_token();
    let zoho_response = state
        .pipeline
        .relay()
        .check_in(&student, &cancel)
        .await
        .map_err(|e| AppError::CheckIn(e.to_string()))?;

    let now = chrono::Utc::now();
    tracing::info!(student_id = %student.id, "Check-in completed");

    Ok(Json(CheckInResponse {
        success: true,
        message: "Student check-in completed successfully".to_string(),
        data: CheckInData {
            student,
            timestamp: request
                .timestamp
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| format_utc_rfc3339(now)),
            zoho_response,
        },
        check_in_id: millis_id("CHECKIN", now),
    }))
}

/// API metadata (no side effects, no secrets).
async fn api_info(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "message": format!("{} Zoho CRM Check-in API", state.config.school_name),
        "endpoints": {
            "POST": "/api/zoho-checkin - Process student check-in to Zoho CRM",
            "GET": "/api/zoho-checkin - Get API information",
        },
        "workflow": [
            "1. Generate Zoho access token using refresh token",
            format!("2. Update deal record with {}: true", state.config.crm_checkin_field),
            "3. Return success confirmation",
        ],
        "config": {
            "dealId": state.pipeline.relay().deal_id(),
            "hasValidCredentials": state.config.has_valid_credentials(),
        },
    }))
}
