//! Structured decode errors and model-level error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Model-level errors for catalog type construction
#[derive(Debug, Error)]
pub enum ModelError {
    /// Pattern keys are not exactly 6 characters over A-Z, 0-9, '*'
    #[error("Invalid pattern keys: {0}")]
    InvalidPatternKeys(String),

    /// Lookup table name not in the closed set of catalog dictionaries
    #[error("Unknown lookup table: {0}")]
    UnknownLookupTable(String),
}

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Error category, stable across releases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// VIN shape problems detected before any catalog access
    Structure,
    /// Self-consistency checks (check digit, year encoding)
    Integrity,
    /// Catalog coverage problems
    Catalog,
    /// Catalog data that disagrees with itself
    Data,
    /// Operational failures
    Runtime,
}

/// Error severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Attached to the result without invalidating it
    Warning,
    /// Makes the overall result invalid
    Fatal,
}

/// Stable decode error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    EmptyInput,
    InvalidLength,
    InvalidCharacters,
    InvalidCheckDigit,
    NonUsYear,
    WmiNotFound,
    LookupMiss,
    PatternNoMatch,
    ModelMakeMismatch,
    Timeout,
    CatalogUnavailable,
}

impl ErrorCode {
    /// Category is a fixed property of the code
    #[must_use]
    pub const fn category(self) -> ErrorCategory {
        match self {
            Self::EmptyInput | Self::InvalidLength | Self::InvalidCharacters => {
                ErrorCategory::Structure
            }
            Self::InvalidCheckDigit | Self::NonUsYear => ErrorCategory::Integrity,
            Self::WmiNotFound | Self::LookupMiss | Self::PatternNoMatch => ErrorCategory::Catalog,
            Self::ModelMakeMismatch => ErrorCategory::Data,
            Self::Timeout | Self::CatalogUnavailable => ErrorCategory::Runtime,
        }
    }

    /// Severity is a fixed property of the code
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::EmptyInput
            | Self::InvalidLength
            | Self::InvalidCharacters
            | Self::WmiNotFound
            | Self::Timeout
            | Self::CatalogUnavailable => Severity::Fatal,
            Self::InvalidCheckDigit
            | Self::NonUsYear
            | Self::LookupMiss
            | Self::PatternNoMatch
            | Self::ModelMakeMismatch => Severity::Warning,
        }
    }

    /// Wire-stable identifier
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmptyInput => "EMPTY_INPUT",
            Self::InvalidLength => "INVALID_LENGTH",
            Self::InvalidCharacters => "INVALID_CHARACTERS",
            Self::InvalidCheckDigit => "INVALID_CHECK_DIGIT",
            Self::NonUsYear => "NON_US_YEAR",
            Self::WmiNotFound => "WMI_NOT_FOUND",
            Self::LookupMiss => "LOOKUP_MISS",
            Self::PatternNoMatch => "PATTERN_NO_MATCH",
            Self::ModelMakeMismatch => "MODEL_MAKE_MISMATCH",
            Self::Timeout => "TIMEOUT",
            Self::CatalogUnavailable => "CATALOG_UNAVAILABLE",
        }
    }
}

/// A structured error attached to a decode result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeError {
    pub code: ErrorCode,
    pub category: ErrorCategory,
    pub severity: Severity,
    pub message: String,
}

impl DecodeError {
    /// Create an error record; category and severity derive from the code
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            category: code.category(),
            severity: code.severity(),
            message: message.into(),
        }
    }

    /// Whether this error invalidates the overall result
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self.severity, Severity::Fatal)
    }
}
