//! # Error Types
//!
//! Structured error types for costing_core. Only structurally invalid input
//! and storage failures surface here. Missing prices, missing densities and
//! unreachable break-even are folded into results as warnings or `None`
//! fields instead.
//!
//! ## Example
//!
//! ```rust
//! use costing_core::errors::{CostingError, CostingResult};
//!
//! fn validate_price(price: f64) -> CostingResult<()> {
//!     if price < 0.0 {
//!         return Err(CostingError::InvalidInput {
//!             field: "pack_price".to_string(),
//!             value: price.to_string(),
//!             reason: "Price cannot be negative".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::units::{Dimension, Unit};

/// Result type alias for costing_core operations
pub type CostingResult<T> = Result<T, CostingError>;

/// Structured error type for costing operations.
///
/// Each variant carries enough context for the caller to show the message
/// verbatim to the end user.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CostingError {
    /// An input value is invalid (out of range, not finite, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// A unit symbol could not be recognized
    #[error("Unknown unit: '{symbol}'")]
    UnknownUnit { symbol: String },

    /// A direct conversion was requested that cannot be performed
    #[error("Conversion failed: {0}")]
    Conversion(ConversionError),

    /// Formula not found in the store
    #[error("Formula not found: {formula}")]
    FormulaNotFound { formula: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

impl CostingError {
    /// Create an InvalidInput error
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CostingError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CostingError::MissingField {
            field: field.into(),
        }
    }

    /// Create a FormulaNotFound error
    pub fn formula_not_found(formula: impl Into<String>) -> Self {
        CostingError::FormulaNotFound {
            formula: formula.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CostingError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(
        path: impl Into<String>,
        locked_by: impl Into<String>,
        locked_at: impl Into<String>,
    ) -> Self {
        CostingError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// True for errors raised by input validation, before any arithmetic ran
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CostingError::InvalidInput { .. }
                | CostingError::MissingField { .. }
                | CostingError::UnknownUnit { .. }
        )
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CostingError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CostingError::InvalidInput { .. } => "INVALID_INPUT",
            CostingError::MissingField { .. } => "MISSING_FIELD",
            CostingError::UnknownUnit { .. } => "UNKNOWN_UNIT",
            CostingError::Conversion(_) => "CONVERSION_FAILED",
            CostingError::FormulaNotFound { .. } => "FORMULA_NOT_FOUND",
            CostingError::FileError { .. } => "FILE_ERROR",
            CostingError::FileLocked { .. } => "FILE_LOCKED",
            CostingError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CostingError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}

impl From<ConversionError> for CostingError {
    fn from(err: ConversionError) -> Self {
        CostingError::Conversion(err)
    }
}

/// Failure of a single unit conversion.
///
/// Calculators turn these into result warnings; only direct conversion
/// requests (e.g. the CLI `convert` command) surface them as errors.
#[derive(Error, Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum ConversionError {
    /// Crossing mass and volume needs a density and none was given
    #[error("density required to convert {from} to {to:?}")]
    MissingDensity { from: Unit, to: Dimension },

    /// Count units never convert to mass or volume
    #[error("cannot convert {from} to {to:?}")]
    Incompatible { from: Unit, to: Dimension },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CostingError::invalid_input(
            "line_items[0].pack_price",
            "-5",
            "Price cannot be negative",
        );
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidInput\""));
        let roundtrip: CostingError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CostingError::missing_field("name").error_code(), "MISSING_FIELD");
        assert_eq!(CostingError::formula_not_found("Shampoo").error_code(), "FORMULA_NOT_FOUND");
        let conv: CostingError = ConversionError::MissingDensity {
            from: Unit::L,
            to: Dimension::Mass,
        }
        .into();
        assert_eq!(conv.error_code(), "CONVERSION_FAILED");
    }

    #[test]
    fn test_validation_classification() {
        assert!(CostingError::invalid_input("x", "1", "bad").is_validation());
        assert!(!CostingError::formula_not_found("x").is_validation());
        assert!(CostingError::file_locked("a", "b", "c").is_recoverable());
    }

    #[test]
    fn test_conversion_error_message() {
        let err = ConversionError::MissingDensity {
            from: Unit::Ml,
            to: Dimension::Mass,
        };
        assert_eq!(err.to_string(), "density required to convert mL to Mass");
    }
}
