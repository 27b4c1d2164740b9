// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Submission pipeline: parse → validate → store → CRM relay.

use crate::db::{StoreError, SubmissionStore, UpsertOutcome};
use crate::models::{StudentData, Submission};
use crate::services::payload::{parse_payload, ParseError};
use crate::services::relay::{CheckInRelay, RelayError};
use crate::services::validation::{validate_qr_student, validate_student, FieldError};
use crate::time_utils::format_utc_rfc3339;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Failures that end a pipeline run before the CRM is contacted.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] FieldError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of recording a submission.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub outcome: UpsertOutcome,
    /// Store size right after the write.
    pub total: usize,
}

/// Result of a full kiosk scan.
#[derive(Debug)]
pub struct ScanCheckIn {
    pub submission: Submission,
    pub recorded: Recorded,
    /// The store write is kept even if this failed.
    pub check_in: Result<serde_json::Value, RelayError>,
}

/// Wires the store and the relay together.
#[derive(Clone)]
pub struct SubmissionPipeline {
    store: Arc<dyn SubmissionStore>,
    relay: CheckInRelay,
}

impl SubmissionPipeline {
    pub fn new(store: Arc<dyn SubmissionStore>, relay: CheckInRelay) -> Self {
        Self { store, relay }
    }

    pub fn store(&self) -> &dyn SubmissionStore {
        self.store.as_ref()
    }

    pub fn relay(&self) -> &CheckInRelay {
        &self.relay
    }

    /// Validate and upsert a submission. Nothing is written if validation fails.
    pub async fn record(&self, submission: Submission) -> Result<Recorded, PipelineError> {
        validate_student(&submission.student)?;

        let id = submission.student.id.clone();
        let outcome = self.store.upsert(submission).await?;
        let total = self.store.count().await?;

        tracing::info!(
            student_id = %id,
            is_update = outcome.is_update(),
            total,
            "Submission recorded"
        );

        Ok(Recorded { outcome, total })
    }

    /// Parse and validate a scanned payload with the badge rules.
    pub fn parse_badge(&self, payload: &str) -> Result<StudentData, PipelineError> {
        let student = parse_payload(payload)?;
        validate_qr_student(&student)?;
        Ok(student)
    }

    /// Run the whole pipeline for one scanned payload.
    pub async fn process_payload(
        &self,
        payload: &str,
        source: &str,
        cancel: &CancellationToken,
    ) -> Result<ScanCheckIn, PipelineError> {
        let student = self.parse_badge(payload)?;

        let submission = Submission {
            student: student.clone(),
            timestamp: format_utc_rfc3339(chrono::Utc::now()),
            source: source.to_string(),
        };

        let recorded = self.record(submission.clone()).await?;
        let check_in = self.relay.check_in(&student, cancel).await;

        Ok(ScanCheckIn {
            submission,
            recorded,
            check_in,
        })
    }
}
