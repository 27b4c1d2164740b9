// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! QR payload parsing.
//!
//! Badges encode `id,name,phone,email` as plain comma-separated text. There is
//! no quoting or escaping: a comma inside a field shifts every later field.

use crate::models::StudentData;

/// Format hint shown when a scanned code is not a student badge.
pub const EXPECTED_FORMAT: &str = "ID,Name,Phone,Email";

const REQUIRED_SEGMENTS: usize = 4;

/// The scanned text did not split into enough fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid QR code format: expected {EXPECTED_FORMAT}, found {segments} field(s)")]
pub struct ParseError {
    pub segments: usize,
}

/// Split a decoded payload into a [`StudentData`].
///
/// Segments are trimmed; anything past the fourth is ignored.
pub fn parse_payload(payload: &str) -> Result<StudentData, ParseError> {
    let parts: Vec<&str> = payload.split(',').map(str::trim).collect();
    if parts.len() < REQUIRED_SEGMENTS {
        return Err(ParseError {
            segments: parts.len(),
        });
    }

    Ok(StudentData::new(parts[0], parts[1], parts[2], parts[3]))
}
