// ABOUTME: Unified error type for binding, session, and executor failures
// ABOUTME: Error codes separate classification, usage, execution, not-found, and scan failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Error Handling
//!
//! Every fallible operation in this crate returns [`BindResult`]. The
//! [`ErrorCode`] carried by [`BindError`] is what callers branch on: a
//! single-record read that matched nothing reports [`ErrorCode::NotFound`],
//! while a row whose values could not be placed into the destination reports
//! [`ErrorCode::ScanFailed`].

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Destination value is not one of the supported binding shapes
    ClassificationFailed,
    /// API misuse, such as a read statement passed to the write path
    UsageError,
    /// Statement preparation or execution failed in the driver
    ExecutionFailed,
    /// A single-record read produced no rows
    NotFound,
    /// Row values could not be placed into the destination
    ScanFailed,
    /// Materialization reached a shape it cannot populate
    BindValue,
    /// Configuration is missing or invalid
    ConfigInvalid,
}

impl ErrorCode {
    /// Get a short description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::ClassificationFailed => "Unsupported binding destination",
            Self::UsageError => "Invalid use of the session API",
            Self::ExecutionFailed => "Statement execution failed",
            Self::NotFound => "No rows in result set",
            Self::ScanFailed => "Row could not be scanned into destination",
            Self::BindValue => "Bind value error",
            Self::ConfigInvalid => "Configuration is invalid",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Unified error type for the crate
#[derive(Debug, Error)]
pub struct BindError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Extra diagnostic detail (for example a failed rollback after a failed step)
    pub detail: Option<String>,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl BindError {
    /// Create a new error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
            source: None,
        }
    }

    /// Attach a detail string
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// True when a single-record read matched no rows
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::NotFound
    }

    /// Destination shape is not supported
    pub fn classification(type_name: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ClassificationFailed,
            format!(
                "destination accepts only record, record-collection, mapping, or mapping-collection, got: {type_name}"
            ),
        )
    }

    /// Caller misused the session API
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UsageError, message)
    }

    /// Driver-level preparation or execution failure
    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExecutionFailed, message)
    }

    /// Single-record read matched nothing
    pub fn not_found() -> Self {
        Self::new(ErrorCode::NotFound, "sql: no rows in result set")
    }

    /// Row could not be placed into the destination
    pub fn scan(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ScanFailed, message)
    }

    /// Materializer was handed a shape it cannot populate
    pub fn bind_value() -> Self {
        Self::new(ErrorCode::BindValue, "Bind value error")
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalid, message)
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

/// Result type alias for convenience
pub type BindResult<T> = Result<T, BindError>;

impl From<sqlx::Error> for BindError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => Self::not_found(),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::scan(error.to_string()).with_source(error)
            }
            other => Self::execution(other.to_string()).with_source(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinct_from_scan() {
        let missing = BindError::not_found();
        let malformed = BindError::scan("expected 3 destination fields, row has 2 columns");

        assert!(missing.is_not_found());
        assert!(!malformed.is_not_found());
        assert_eq!(malformed.code, ErrorCode::ScanFailed);
    }

    #[test]
    fn test_display_includes_detail() {
        let error = BindError::execution("constraint failed").with_detail("rollback failed: closed");
        let text = error.to_string();

        assert!(text.starts_with("Statement execution failed: constraint failed"));
        assert!(text.ends_with("(rollback failed: closed)"));
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::ClassificationFailed).unwrap();
        assert_eq!(json, "\"CLASSIFICATION_FAILED\"");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let error = BindError::from(sqlx::Error::RowNotFound);
        assert_eq!(error.code, ErrorCode::NotFound);
    }
}
