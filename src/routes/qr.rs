// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! QR payload validation and server-side frame decoding.

use crate::error::{AppError, Result};
use crate::models::StudentData;
use crate::scanner::Frame;
use crate::services::payload::EXPECTED_FORMAT;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A 1280x720 RGBA frame is ~3.7 MB raw, ~4.9 MB as base64.
const FRAME_BODY_LIMIT: usize = 8 * 1024 * 1024;

/// QR routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/validate-qr", post(validate_qr))
        .route(
            "/api/qr/decode",
            post(decode_frame).layer(DefaultBodyLimit::max(FRAME_BODY_LIMIT)),
        )
}

#[derive(Deserialize)]
struct ValidateQrRequest {
    payload: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ValidateQrResponse {
    pub success: bool,
    pub data: StudentData,
    pub format: String,
}

/// Parse and validate a scanned payload without storing anything.
async fn validate_qr(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<ValidateQrRequest>, JsonRejection>,
) -> Result<Json<ValidateQrResponse>> {
    let Json(request) = body?;
    let student = state.pipeline.parse_badge(&request.payload)?;

    Ok(Json(ValidateQrResponse {
        success: true,
        data: student,
        format: EXPECTED_FORMAT.to_string(),
    }))
}

#[derive(Deserialize)]
struct DecodeFrameRequest {
    width: u32,
    height: u32,
    /// Base64 RGBA, row-major, 4 bytes per pixel
    pixels: String,
}

#[derive(Serialize, Default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct DecodeFrameResponse {
    pub success: bool,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<StudentData>,
    /// Set when a code was found but is not a student badge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

/// Decode one camera frame. No code in the frame is a normal 200 result.
async fn decode_frame(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<DecodeFrameRequest>, JsonRejection>,
) -> Result<Json<DecodeFrameResponse>> {
    let Json(request) = body?;

    let rgba = BASE64
        .decode(request.pixels.as_bytes())
        .map_err(|e| AppError::InvalidBody(format!("pixels: {}", e)))?;
    let frame = Frame::new(request.width, request.height, rgba)
        .map_err(|e| AppError::InvalidBody(e.to_string()))?;

    // Decoding is CPU-bound; keep it off the request workers.
    let decoder = state.decoder.clone();
    let payload = tokio::task::spawn_blocking(move || decoder.decode(&frame))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("decoder task failed: {}", e)))?;

    let Some(payload) = payload else {
        return Ok(Json(DecodeFrameResponse {
            success: true,
            ..Default::default()
        }));
    };

    tracing::info!(length = payload.len(), "QR code decoded");

    let (student, parse_error) = match state.pipeline.parse_badge(&payload) {
        Ok(student) => (Some(student), None),
        Err(e) => (None, Some(e.to_string())),
    };

    Ok(Json(DecodeFrameResponse {
        success: true,
        found: true,
        payload: Some(payload),
        student,
        parse_error,
    }))
}
