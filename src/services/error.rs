use std::collections::HashMap;

use crate::auth::{JwtError, PasswordError};
use crate::database::DatabaseError;
use crate::filter::FilterError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },
    #[error("{0}")]
    Conflict(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),
    #[error("Token error: {0}")]
    Token(#[from] JwtError),
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
}

/// Collects per-field problems so one response can name all of them
#[derive(Debug, Default)]
pub struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, problem: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| problem.into());
    }

    /// True when any field was recorded with exactly `problem`
    pub fn mentions(&self, problem: &str) -> bool {
        self.0.values().any(|p| p == problem)
    }

    pub fn into_error(self, message: &str) -> ServiceError {
        ServiceError::Validation {
            message: message.to_string(),
            field_errors: self.0,
        }
    }

    /// `Ok` when nothing was recorded, otherwise a validation error with `message`
    pub fn into_result(self, message: &str) -> Result<(), ServiceError> {
        if self.0.is_empty() {
            return Ok(());
        }
        Err(self.into_error(message))
    }
}
