//! Error types for octsvm operations.
//!
//! Every failure surfaced by model construction, solver invocation or
//! result extraction is an [`OctError`]. Input validation always happens
//! before any variable is allocated, so a validation error never leaves a
//! half-built model behind.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for octsvm operations.
///
/// # Examples
///
/// ```
/// use octsvm::error::OctError;
///
/// let err = OctError::empty_input("training samples");
/// assert!(err.to_string().contains("empty input"));
/// ```
#[derive(Error, Debug)]
pub enum OctError {
    /// Input data failed validation (empty, mismatched, non-finite, bad labels).
    #[error("Validation failed: {message}")]
    Validation {
        /// Validation failure message
        message: String,
    },

    /// Feature/label dimensions don't agree.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Invalid hyperparameter value provided.
    #[error("Invalid hyperparameter: {param} = {value}, expected {constraint}")]
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// The external solver could not be run or produced unusable output.
    #[error("Solver error: {0}")]
    Solver(String),

    /// A prediction was requested before a successful fit.
    #[error("Model not fitted: call fit() first")]
    NotFitted,

    /// The solver executable was not found.
    #[error("Solver executable not found: {0}")]
    SolverNotFound(PathBuf),

    /// I/O error (scratch files, solver pipes).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OctError {
    /// Create a validation error for an empty input
    #[must_use]
    pub fn empty_input(context: &str) -> Self {
        Self::Validation {
            message: format!("empty input: {context}"),
        }
    }

    /// Create a dimension mismatch error with descriptive context
    #[must_use]
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{context}={expected}"),
            actual: format!("{actual}"),
        }
    }

    /// Create an invalid hyperparameter error
    #[must_use]
    pub fn invalid_hyperparameter(
        param: &str,
        value: impl ToString,
        constraint: &str,
    ) -> Self {
        Self::InvalidHyperparameter {
            param: param.to_string(),
            value: value.to_string(),
            constraint: constraint.to_string(),
        }
    }

    /// Create a generic validation error
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether this error was raised by input validation, i.e. before any
    /// part of a model was built.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::DimensionMismatch { .. }
                | Self::InvalidHyperparameter { .. }
        )
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, OctError>;
