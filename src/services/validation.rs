// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Field validation for student identity records.
//!
//! Four independent pattern checks (id, name, phone, email). The first
//! failing field is reported, in the order the kiosk API has always used:
//! missing fields, then id, email, phone and name.

use crate::models::StudentData;
use regex::Regex;
use std::sync::LazyLock;
use validator::Validate;

/// Digits only.
pub static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("valid id pattern"));

/// Letters and spaces only.
pub static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s]+$").expect("valid name pattern"));

/// Optional leading `+`, then digits, spaces, hyphens and parentheses.
pub static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9\s\-()]+$").expect("valid phone pattern"));

/// Loose `local@domain.tld` shape.
pub static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

/// Minimum id length accepted from a QR badge.
pub const QR_MIN_ID_LEN: usize = 10;
/// Minimum name length accepted from a QR badge.
pub const QR_MIN_NAME_LEN: usize = 2;

/// Order in which field failures are reported.
const FIELD_ORDER: [&str; 4] = ["id", "email", "phone", "name"];

/// A single field validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("Missing required fields")]
    Missing,
    #[error("Invalid ID format")]
    InvalidId,
    #[error("Invalid email format")]
    InvalidEmail,
    #[error("Invalid phone format")]
    InvalidPhone,
    #[error("Invalid name format")]
    InvalidName,
    #[error("ID too short")]
    IdTooShort,
    #[error("Name too short")]
    NameTooShort,
}

impl FieldError {
    /// Field the failure refers to, if it concerns a single field.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            FieldError::Missing => None,
            FieldError::InvalidId | FieldError::IdTooShort => Some("id"),
            FieldError::InvalidEmail => Some("email"),
            FieldError::InvalidPhone => Some("phone"),
            FieldError::InvalidName | FieldError::NameTooShort => Some("name"),
        }
    }

    /// Human-readable explanation shown to the kiosk user.
    pub fn details(&self) -> String {
        match self {
            FieldError::Missing => {
                "All fields (ID, Name, Phone, Email) are required".to_string()
            }
            FieldError::InvalidId => "Student ID must contain only numbers".to_string(),
            FieldError::InvalidEmail => "Please provide a valid email address".to_string(),
            FieldError::InvalidPhone => "Please provide a valid phone number".to_string(),
            FieldError::InvalidName => "Name should contain only letters and spaces".to_string(),
            FieldError::IdTooShort => {
                format!("Student ID must be at least {} digits", QR_MIN_ID_LEN)
            }
            FieldError::NameTooShort => {
                format!("Name must be at least {} characters", QR_MIN_NAME_LEN)
            }
        }
    }

    fn from_field(field: &str) -> Option<Self> {
        match field {
            "id" => Some(FieldError::InvalidId),
            "email" => Some(FieldError::InvalidEmail),
            "phone" => Some(FieldError::InvalidPhone),
            "name" => Some(FieldError::InvalidName),
            _ => None,
        }
    }
}

/// Validate a record for the submission endpoint.
pub fn validate_student(student: &StudentData) -> Result<(), FieldError> {
    let fields = [&student.id, &student.name, &student.phone, &student.email];
    if fields.iter().any(|f| f.is_empty()) {
        return Err(FieldError::Missing);
    }

    let Err(errors) = student.validate() else {
        return Ok(());
    };

    let failed = errors.field_errors();
    FIELD_ORDER
        .into_iter()
        .find(|field| failed.contains_key(*field))
        .and_then(FieldError::from_field)
        .map_or(Ok(()), Err)
}

/// Validate a record decoded from a QR badge.
///
/// Badges carry full enrolment ids, so on top of the field patterns the id
/// must be at least [`QR_MIN_ID_LEN`] digits and the name at least
/// [`QR_MIN_NAME_LEN`] characters.
pub fn validate_qr_student(student: &StudentData) -> Result<(), FieldError> {
    validate_student(student)?;

    if student.id.len() < QR_MIN_ID_LEN {
        return Err(FieldError::IdTooShort);
    }
    if student.name.chars().count() < QR_MIN_NAME_LEN {
        return Err(FieldError::NameTooShort);
    }
    Ok(())
}
