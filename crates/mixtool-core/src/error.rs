//! Error types and error code constants for mixtool.
//!
//! This module provides a unified error type (`MixError`) that bridges
//! domain-specific errors from the resolution and planning subsystems into
//! a common format suitable for host consumption.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad input from caller)
//! - `3`: Resolution errors (symbol not found, unresolved target, file not found)
//! - `4`: Ambiguous rename (blocking dispatch ambiguity)
//! - `5`: Apply errors (edit preconditions failed)
//! - `10`: Internal errors (bugs, unexpected state)
//!
//! ## Design
//!
//! - **Unified type**: `MixError` is the single error type for host output
//! - **Bridging**: `impl From<X> for MixError` bridges domain errors
//! - **Code mapping**: `OutputErrorCode` provides stable integer codes

use std::fmt;

use thiserror::Error;

use crate::patch::ApplyError;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Stable error codes for host-facing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, malformed request).
    InvalidArguments = 2,
    /// Resolution errors (symbol not found, unresolved call, file not found).
    ResolutionError = 3,
    /// Ambiguous rename (dispatch could reach more than one declaration).
    AmbiguousRename = 4,
    /// Apply errors (edit preconditions failed against host content).
    ApplyError = 5,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for host output.
///
/// This is the canonical error type that all subsystem errors are converted
/// to before being rendered to a host. Each variant includes enough context
/// to produce a helpful message.
#[derive(Debug, Error)]
pub enum MixError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// No symbol at the specified location.
    #[error("no symbol found at {file} offset {offset}")]
    SymbolNotFound { file: String, offset: u64 },

    /// File not known to the symbol graph.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// Rename blocked by dispatch ambiguity.
    #[error("ambiguous rename of '{method}', candidates: {}", candidates.join(", "))]
    AmbiguousRename {
        method: String,
        candidates: Vec<String>,
    },

    /// Invalid identifier (syntax error in new name).
    #[error("invalid identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: String },

    /// Failed to apply edits.
    #[error("apply error: {message}")]
    Apply { message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    Internal { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&MixError> for OutputErrorCode {
    fn from(err: &MixError) -> Self {
        match err {
            MixError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            MixError::SymbolNotFound { .. } => OutputErrorCode::ResolutionError,
            MixError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            MixError::AmbiguousRename { .. } => OutputErrorCode::AmbiguousRename,
            MixError::InvalidIdentifier { .. } => OutputErrorCode::InvalidArguments,
            MixError::Apply { .. } => OutputErrorCode::ApplyError,
            MixError::Internal { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<MixError> for OutputErrorCode {
    fn from(err: MixError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Bridges
// ============================================================================

impl From<ApplyError> for MixError {
    fn from(err: ApplyError) -> Self {
        MixError::Apply {
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl MixError {
    /// Create an invalid arguments error with optional details.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        MixError::InvalidArguments {
            message: message.into(),
            details: None,
        }
    }

    /// Create a symbol not found error.
    pub fn symbol_not_found(file: impl Into<String>, offset: u64) -> Self {
        MixError::SymbolNotFound {
            file: file.into(),
            offset,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        MixError::Internal {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
