// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Kiosk check-in: scan a student QR badge and check the visit into the CRM
//!
//! This crate provides the backend API for the check-in kiosk: storing
//! submitted student records and relaying check-ins to Zoho CRM, plus the
//! kiosk-side QR decoder and scan loop.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod scanner;
pub mod services;
pub mod time_utils;

use config::Config;
use scanner::{FrameDecoder, ScanSession};
use services::SubmissionPipeline;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub pipeline: SubmissionPipeline,
    pub decoder: Arc<dyn FrameDecoder>,
    /// Cancelled on shutdown; request handlers derive child tokens from it.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// A kiosk scan session using the shared decoder and configured hint delay.
    pub fn scan_session(&self) -> ScanSession {
        ScanSession::from_config(&self.config, self.decoder.clone())
    }
}
