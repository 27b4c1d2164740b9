//! Student identity and submission models.

use crate::services::validation::{EMAIL_PATTERN, ID_PATTERN, NAME_PATTERN, PHONE_PATTERN};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// The four identity fields carried from the QR code to the CRM.
///
/// Missing JSON fields deserialize as empty strings so that the handlers can
/// report them as a validation failure instead of a body rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(default)]
pub struct StudentData {
    #[validate(regex(path = *ID_PATTERN, code = "id"))]
    pub id: String,
    #[validate(regex(path = *NAME_PATTERN, code = "name"))]
    pub name: String,
    #[validate(regex(path = *PHONE_PATTERN, code = "phone"))]
    pub phone: String,
    #[validate(regex(path = *EMAIL_PATTERN, code = "email"))]
    pub email: String,
}

impl StudentData {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        phone: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phone: phone.into(),
            email: email.into(),
        }
    }
}

/// A stored submission: the identity record plus when and where it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Submission {
    #[serde(flatten)]
    #[cfg_attr(feature = "binding-generation", ts(flatten))]
    pub student: StudentData,
    /// Client-supplied capture time (ISO 8601)
    #[serde(default)]
    pub timestamp: String,
    /// Where the record came from ("qr_scan", "manual", ...)
    #[serde(default)]
    pub source: String,
}

impl Submission {
    pub fn id(&self) -> &str {
        &self.student.id
    }
}
