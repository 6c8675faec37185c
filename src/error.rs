//! Unified Error Handling for the Golomb Search Engine
//!
//! This module provides the error type hierarchy for all engine operations.
//! All errors use the `thiserror` crate for ergonomic error handling.
//!
//! # Examples
//!
//! ## Error propagation
//!
//! ```rust,no_run
//! use golomb_engine::error::{ConfigError, GolombError, Result};
//!
//! fn load_config(path: &str) -> Result<()> {
//!     // Errors automatically convert to GolombError via the From trait
//!     Err(ConfigError::file_not_found(path).into())
//! }
//! ```
//!
//! # Error Types
//!
//! - [`GolombError`]: Root error type for all engine operations
//! - [`SearchError`]: Argument validation and ruler construction errors
//! - [`ConfigError`]: Configuration validation and loading errors
//! - [`CheckpointError`]: Checkpoint file I/O errors
//!
//! The search core itself never propagates errors mid-search: an
//! unsatisfiable search surfaces as an empty result, and checkpoint I/O
//! failures are logged at the boundary and ignored.

use thiserror::Error;

/// Root error type for all engine operations
///
/// All module-specific errors convert to this type via `From`.
#[derive(Error, Debug)]
pub enum GolombError {
    /// Search argument or ruler validation errors
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Checkpoint errors
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Search-related errors
///
/// The search routines report unsatisfiability as an empty result, not an
/// error; these variants cover misuse that callers can pre-validate.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Requested order outside the supported range
    #[error("Invalid order: {order} (valid range: 2-{max})")]
    InvalidOrder { order: u32, max: u32 },

    /// Requested target length outside the supported range
    #[error("Invalid target length: {length} (maximum: {max})")]
    InvalidLength { length: u32, max: u32 },

    /// A position sequence violating the Golomb ruler invariants
    #[error("Invalid ruler: {message}")]
    InvalidRuler { message: String },
}

impl SearchError {
    /// Create an invalid order error
    pub fn invalid_order(order: u32) -> Self {
        Self::InvalidOrder { order, max: crate::types::MAX_MARKS as u32 }
    }

    /// Create an invalid length error
    pub fn invalid_length(length: u32) -> Self {
        Self::InvalidLength { length, max: crate::types::MAX_LENGTH }
    }

    /// Create an invalid ruler error
    pub fn invalid_ruler<S: Into<String>>(message: S) -> Self {
        Self::InvalidRuler { message: message.into() }
    }
}

/// Configuration errors
///
/// Errors that can occur during configuration validation or loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid configuration value for '{field}': {value} (expected: {expected})")]
    InvalidValue { field: String, value: String, expected: String },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Failed to parse a configuration file
    #[error("Failed to parse configuration file '{path}': {message}")]
    ParseError { path: String, message: String },

    /// Configuration serialization failed
    #[error("Configuration serialization failed: {message}")]
    SerializationFailed { message: String },
}

impl ConfigError {
    /// Create an invalid value error
    pub fn invalid_value<S1: Into<String>, S2: Into<String>, S3: Into<String>>(
        field: S1,
        value: S2,
        expected: S3,
    ) -> Self {
        Self::InvalidValue { field: field.into(), value: value.into(), expected: expected.into() }
    }

    /// Create a file not found error
    pub fn file_not_found<S: Into<String>>(path: S) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a parse error
    pub fn parse_error<S1: Into<String>, S2: Into<String>>(path: S1, message: S2) -> Self {
        Self::ParseError { path: path.into(), message: message.into() }
    }

    /// Create a serialization failed error
    pub fn serialization_failed<S: Into<String>>(message: S) -> Self {
        Self::SerializationFailed { message: message.into() }
    }
}

/// Checkpoint file errors
///
/// Checkpointing is best-effort: the drivers log these at the boundary and
/// continue searching without resume support.
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// Reading or writing the checkpoint file failed
    #[error("Checkpoint I/O failed for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Atomic replacement of the checkpoint file failed
    #[error("Checkpoint rename failed for '{path}': {source}")]
    Rename {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CheckpointError {
    /// Create an I/O error for the given checkpoint path
    pub fn io<P: AsRef<std::path::Path>>(path: P, source: std::io::Error) -> Self {
        Self::Io { path: path.as_ref().display().to_string(), source }
    }

    /// Create a rename error for the given checkpoint path
    pub fn rename<P: AsRef<std::path::Path>>(path: P, source: std::io::Error) -> Self {
        Self::Rename { path: path.as_ref().display().to_string(), source }
    }
}

/// Convenience type alias for Result with GolombError
pub type Result<T, E = GolombError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let err: GolombError = SearchError::invalid_order(40).into();
        assert!(matches!(err, GolombError::Search(SearchError::InvalidOrder { order: 40, .. })));
    }

    #[test]
    fn test_error_messages() {
        let err = SearchError::invalid_length(900);
        assert!(err.to_string().contains("900"));
        assert!(err.to_string().contains("600"));

        let err = ConfigError::invalid_value("checkpoint.interval_secs", "0", ">= 1");
        assert!(err.to_string().contains("checkpoint.interval_secs"));
    }
}
