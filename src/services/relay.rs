// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Check-in relay: token exchange, then deal update.
//!
//! `TokenPending → DealUpdatePending → Success | Failed`
//!
//! A fresh access token is fetched for every check-in. The token exchange is
//! retried with exponential backoff on transient failures; the deal update is
//! sent exactly once. Both calls race the caller's cancellation token.

use crate::models::StudentData;
use crate::services::crm::{AccessToken, CrmApi, CrmError};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Upper bound for a single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Relay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStep {
    TokenPending,
    DealUpdatePending,
    Success,
    Failed,
}

impl fmt::Display for RelayStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelayStep::TokenPending => "token exchange",
            RelayStep::DealUpdatePending => "deal update",
            RelayStep::Success => "success",
            RelayStep::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Why a check-in did not reach `Success`.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Token generation failed: {source}")]
    TokenExchange { attempts: u32, source: CrmError },

    #[error("Deal update failed: {0}")]
    DealUpdate(CrmError),

    #[error("Check-in cancelled during {0}")]
    Cancelled(RelayStep),
}

impl RelayError {
    /// The step that was pending when the relay failed.
    pub fn step(&self) -> RelayStep {
        match self {
            RelayError::TokenExchange { .. } => RelayStep::TokenPending,
            RelayError::DealUpdate(_) => RelayStep::DealUpdatePending,
            RelayError::Cancelled(step) => *step,
        }
    }
}

/// Retry schedule for the token exchange.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first (minimum 1).
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each failure.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// No retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(250))
    }
}

/// Drives the two CRM calls for a check-in.
#[derive(Clone)]
pub struct CheckInRelay {
    crm: Arc<dyn CrmApi>,
    deal_id: String,
    retry: RetryPolicy,
}

impl CheckInRelay {
    pub fn new(crm: Arc<dyn CrmApi>, deal_id: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            crm,
            deal_id: deal_id.into(),
            retry,
        }
    }

    pub fn deal_id(&self) -> &str {
        &self.deal_id
    }

    /// Run the relay for one student.
    ///
    /// On success returns the deal-update response body.
    pub async fn check_in(
        &self,
        student: &StudentData,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value, RelayError> {
        tracing::info!(
            student_id = %student.id,
            step = %RelayStep::TokenPending,
            "Check-in relay started"
        );

        let token = match self.fetch_token(cancel).await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(
                    student_id = %student.id,
                    error = %e,
                    step = %RelayStep::Failed,
                    "Check-in relay failed"
                );
                return Err(e);
            }
        };

        tracing::info!(
            student_id = %student.id,
            step = %RelayStep::DealUpdatePending,
            deal_id = %self.deal_id,
            "Updating deal"
        );

        let result = race(
            cancel,
            RelayStep::DealUpdatePending,
            self.crm.update_deal(&token, &self.deal_id),
        )
        .await
        .and_then(|r| r.map_err(RelayError::DealUpdate));

        match &result {
            Ok(_) => {
                tracing::info!(
                    student_id = %student.id,
                    step = %RelayStep::Success,
                    "Check-in relay completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    student_id = %student.id,
                    error = %e,
                    step = %RelayStep::Failed,
                    "Check-in relay failed"
                );
            }
        }
        result
    }

    async fn fetch_token(&self, cancel: &CancellationToken) -> Result<AccessToken, RelayError> {
        let mut attempt = 1;
        loop {
            let result = race(
                cancel,
                RelayStep::TokenPending,
                self.crm.exchange_refresh_token(),
            )
            .await?;

            match result {
                Ok(token) => return Ok(token),
                Err(e) if e.is_transient() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_after(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Token exchange failed, retrying"
                    );
                    race(cancel, RelayStep::TokenPending, tokio::time::sleep(delay)).await?;
                    attempt += 1;
                }
                Err(source) => {
                    return Err(RelayError::TokenExchange {
                        attempts: attempt,
                        source,
                    })
                }
            }
        }
    }
}

/// Run `fut` unless `cancel` fires first.
async fn race<F: Future>(
    cancel: &CancellationToken,
    step: RelayStep,
    fut: F,
) -> Result<F::Output, RelayError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RelayError::Cancelled(step)),
        output = fut => Ok(output),
    }
}
