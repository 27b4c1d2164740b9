// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Kiosk-side QR capture: decoder adapter and scan session.

pub mod decoder;
pub mod session;

pub use decoder::{Frame, FrameDecoder, FrameError, QrDecoder};
pub use session::{FrameSource, ScanError, ScanOutcome, ScanSession, ScanState, StopReason};
