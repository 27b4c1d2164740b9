// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scan session: `Idle → Scanning → Found | Stopped`.
//!
//! The session owns the camera stream while scanning and releases it on
//! every exit path, including when the `run` future is dropped.

use super::decoder::{Frame, FrameDecoder};
use crate::config::Config;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Default delay before the "nothing found yet" hint.
pub const DEFAULT_HINT_AFTER: Duration = Duration::from_secs(15);

/// Errors from the frame source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("camera unavailable: {0}")]
    Camera(String),
}

/// Why scanning stopped without a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    SourceEnded,
    Failed(String),
}

/// Observable session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    /// `hint` turns true once the watchdog interval passed without a code.
    Scanning {
        hint: bool,
    },
    Found(String),
    Stopped(StopReason),
}

/// Terminal result of a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Found(String),
    Stopped(StopReason),
}

/// A camera stream.
#[async_trait]
pub trait FrameSource: Send {
    /// Wait for the next frame; `Ok(None)` once the stream has ended.
    async fn next_frame(&mut self) -> Result<Option<Frame>, ScanError>;

    /// Stop the underlying tracks. Called exactly once per session.
    fn release(&mut self);
}

/// Releases the stream when dropped unless already released.
struct StreamGuard<S: FrameSource> {
    source: S,
    released: bool,
}

impl<S: FrameSource> StreamGuard<S> {
    fn new(source: S) -> Self {
        Self {
            source,
            released: false,
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.source.release();
        }
    }
}

impl<S: FrameSource> Drop for StreamGuard<S> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Drives a frame source through a decoder until a code is found.
pub struct ScanSession {
    decoder: Arc<dyn FrameDecoder>,
    hint_after: Duration,
    state: watch::Sender<ScanState>,
}

impl ScanSession {
    pub fn new(decoder: Arc<dyn FrameDecoder>, hint_after: Duration) -> Self {
        let (state, _) = watch::channel(ScanState::Idle);
        Self {
            decoder,
            hint_after,
            state,
        }
    }

    /// Session with the hint interval from `SCAN_HINT_SECS`.
    pub fn from_config(config: &Config, decoder: Arc<dyn FrameDecoder>) -> Self {
        Self::new(decoder, config.scan_hint_after)
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ScanState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ScanState {
        self.state.borrow().clone()
    }

    /// Scan until a code is decoded, `cancel` fires, or the source ends.
    ///
    /// The watchdog only publishes a hint; it never stops the scan.
    pub async fn run<S: FrameSource>(
        &self,
        source: S,
        cancel: &CancellationToken,
    ) -> Result<ScanOutcome, ScanError> {
        let mut stream = StreamGuard::new(source);
        self.state.send_replace(ScanState::Scanning { hint: false });
        tracing::debug!("Scanning started");

        let watchdog = tokio::time::sleep(self.hint_after);
        tokio::pin!(watchdog);
        let mut hinted = false;
        let mut attempts: u64 = 0;

        let result = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    break Ok(ScanOutcome::Stopped(StopReason::Cancelled));
                }
                _ = &mut watchdog, if !hinted => {
                    hinted = true;
                    tracing::info!(attempts, "No QR code found yet");
                    self.state.send_replace(ScanState::Scanning { hint: true });
                }
                frame = stream.source.next_frame() => match frame {
                    Err(e) => break Err(e),
                    Ok(None) => break Ok(ScanOutcome::Stopped(StopReason::SourceEnded)),
                    Ok(Some(frame)) => {
                        attempts += 1;
                        if let Some(payload) = self.decoder.decode(&frame) {
                            break Ok(ScanOutcome::Found(payload));
                        }
                        tokio::task::yield_now().await;
                    }
                },
            }
        };

        stream.release();

        let final_state = match &result {
            Ok(ScanOutcome::Found(payload)) => ScanState::Found(payload.clone()),
            Ok(ScanOutcome::Stopped(reason)) => ScanState::Stopped(reason.clone()),
            Err(e) => ScanState::Stopped(StopReason::Failed(e.to_string())),
        };
        tracing::debug!(attempts, state = ?final_state, "Scanning finished");
        self.state.send_replace(final_state);

        result
    }
}
