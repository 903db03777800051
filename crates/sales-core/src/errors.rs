//! Error taxonomy for the request pipeline.
//!
//! Every failure leaving a handler is one of four shapes. The error
//! translation middleware matches on them exhaustively, so adding a variant
//! here forces the translator to be updated.

use std::fmt;

use anyhow::Error;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

/// One or more validation failures collected from a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, error: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            error: error.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[FieldError] {
        &self.0
    }

    /// `Ok(())` when nothing was collected, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Fields(self))
        }
    }
}

impl FromIterator<FieldError> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = FieldError>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, fe) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", fe.field, fe.error)?;
        }
        Ok(())
    }
}

/// The body sent to clients for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_fields(error: impl Into<String>, fields: &FieldErrors) -> Self {
        Self {
            error: error.into(),
            fields: fields.as_slice().to_vec(),
        }
    }
}

/// Application error.
///
/// `AppError` intentionally does not implement [`std::error::Error`]: any
/// foreign error reached through `?` converts into [`AppError::Unclassified`]
/// via the blanket `From` impl below, and only code that knows what went
/// wrong builds the other variants.
#[derive(Debug)]
pub enum AppError {
    /// Input validation failures, reported as 400 with per-field detail.
    Fields(FieldErrors),
    /// A failure the handler chose a client-visible status and message for.
    Request { status: StatusCode, message: String },
    /// The process is in a state it cannot recover from and must stop.
    Shutdown(String),
    /// Anything else. Reported to clients as a bare 500.
    Unclassified(Error),
}

impl AppError {
    pub fn request(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Request {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::request(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::request(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::request(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::request(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::request(StatusCode::CONFLICT, message)
    }

    pub fn shutdown(message: impl Into<String>) -> Self {
        Self::Shutdown(message.into())
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::Unclassified(err.into())
    }

    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::Shutdown(_))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fields(fields) => write!(f, "data validation error: {fields}"),
            Self::Request { status, message } => write!(f, "{}: {message}", status.as_u16()),
            Self::Shutdown(message) => write!(f, "shutdown: {message}"),
            Self::Unclassified(err) => write!(f, "{err:#}"),
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(fields: FieldErrors) -> Self {
        Self::Fields(fields)
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}
