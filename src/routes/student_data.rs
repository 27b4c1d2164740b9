// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Student submission routes.

use crate::error::{AppError, Result};
use crate::models::Submission;
use crate::time_utils::{format_utc_rfc3339, millis_id};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Submission routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/student-data", get(api_info).post(submit))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStats {
    pub total_submissions: usize,
    pub submitted_at: String,
    pub school: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub success: bool,
    pub message: String,
    pub data: Submission,
    pub submission_id: String,
    pub is_update: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SubmissionStats>,
}

/// Store a student submission, replacing any earlier one with the same id.
async fn submit(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<Submission>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmissionResponse>)> {
    let Json(mut submission) = body?;

    let now = chrono::Utc::now();
    if submission.timestamp.is_empty() {
        submission.timestamp = format_utc_rfc3339(now);
    }

    let recorded = state.pipeline.record(submission.clone()).await?;
    let school = &state.config.school_name;

    if recorded.outcome.is_update() {
        return Ok((
            StatusCode::OK,
            Json(SubmissionResponse {
                success: true,
                message: "Student data updated successfully".to_string(),
                data: submission,
                submission_id: millis_id("UPD", now),
                is_update: true,
                stats: None,
            }),
        ));
    }

    Ok((
        StatusCode::CREATED,
        Json(SubmissionResponse {
            success: true,
            message: format!("Student data submitted successfully to {} system", school),
            data: submission,
            submission_id: millis_id("SUB", now),
            is_update: false,
            stats: Some(SubmissionStats {
                total_submissions: recorded.total,
                submitted_at: format_utc_rfc3339(now),
                school: school.clone(),
            }),
        }),
    ))
}

/// API metadata (no side effects).
async fn api_info(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>> {
    let total = state
        .pipeline
        .store()
        .count()
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;
    let school = &state.config.school_name;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("{} Student Data Management API", school),
        "school": school,
        "stats": {
            "totalSubmissions": total,
            "apiVersion": env!("CARGO_PKG_VERSION"),
            "lastUpdated": format_utc_rfc3339(chrono::Utc::now()),
        },
        "endpoints": {
            "POST": "/api/student-data - Submit student information",
            "GET": "/api/student-data - Get API information",
        },
        "features": [
            "QR code scanning",
            "Field validation",
            "Duplicate detection by student ID",
            "Submission tracking",
        ],
    })))
}
