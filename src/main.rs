// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Kiosk check-in API server
//!
//! Stores student submissions scanned at the kiosk and relays check-ins
//! to the CRM deal record.

use anyhow::Context;
use kiosk_checkin::{
    config::Config,
    db::MemoryStore,
    scanner::QrDecoder,
    services::{CheckInRelay, CrmApi, RetryPolicy, SubmissionPipeline, ZohoClient},
    AppState,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.port, "Starting kiosk check-in API");

    let crm: Arc<dyn CrmApi> =
        Arc::new(ZohoClient::new(&config).context("Failed to build CRM client")?);
    let relay = CheckInRelay::new(
        crm,
        config.crm_deal_id.clone(),
        RetryPolicy::new(config.token_retry_attempts, config.token_retry_base_delay),
    );
    tracing::info!(
        deal_id = %config.crm_deal_id,
        attempts = config.token_retry_attempts,
        "CRM relay initialized"
    );

    // Submissions live for the lifetime of the process
    let pipeline = SubmissionPipeline::new(Arc::new(MemoryStore::new()), relay);

    let shutdown = CancellationToken::new();
    let state = Arc::new(AppState {
        config: config.clone(),
        pipeline,
        decoder: Arc::new(QrDecoder),
        shutdown: shutdown.clone(),
    });

    // Build router
    let app = kiosk_checkin::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Wait for Ctrl-C, then cancel in-flight CRM calls.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown requested");
    shutdown.cancel();
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kiosk_checkin=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
