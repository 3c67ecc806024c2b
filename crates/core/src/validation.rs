//! Field rules shared by project create and update payloads.

use crate::error::{CoreError, FieldError};

/// Minimum project name length, in characters.
pub const MIN_NAME_LEN: usize = 3;
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;

pub fn check_name(name: &str) -> Result<(), String> {
    if name.trim().chars().count() < MIN_NAME_LEN {
        return Err(format!("name must be at least {MIN_NAME_LEN} characters"));
    }
    Ok(())
}

pub fn check_year(year: i32) -> Result<(), String> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(format!("year must be between {MIN_YEAR} and {MAX_YEAR}"));
    }
    Ok(())
}

pub fn check_positive(value: f64) -> Result<(), String> {
    if !value.is_finite() || value <= 0.0 {
        return Err("must be a positive number".to_string());
    }
    Ok(())
}

pub fn check_positive_id(id: i64) -> Result<(), String> {
    if id <= 0 {
        return Err("must be a positive id".to_string());
    }
    Ok(())
}

/// Collects field failures so a payload reports all of them at once.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `result` against `field` if it failed.
    pub fn check(&mut self, field: &str, result: Result<(), String>) {
        if let Err(message) = result {
            self.0.push(FieldError::new(field, message));
        }
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    /// `Ok(())` when nothing failed, otherwise [`CoreError::InvalidFields`].
    pub fn into_result(self) -> Result<(), CoreError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(CoreError::InvalidFields(self.0))
        }
    }
}
