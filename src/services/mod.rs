// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod crm;
pub mod payload;
pub mod pipeline;
pub mod relay;
pub mod validation;

pub use crm::{AccessToken, CrmApi, CrmError, ZohoClient};
pub use payload::{parse_payload, ParseError};
pub use pipeline::{PipelineError, SubmissionPipeline};
pub use relay::{CheckInRelay, RelayError, RelayStep, RetryPolicy};
pub use validation::{validate_qr_student, validate_student, FieldError};
