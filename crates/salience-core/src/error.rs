//! Error types and exit codes for salience
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure
//! - 2: Usage error (bad flags/args, invalid configuration)
//! - 3: Data/store error (missing store, unknown note, corrupt record)

mod macros;

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes used by the salience CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage error - bad flags/args (2)
    Usage = 2,
    /// Data/store error (3)
    Data = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

/// Errors that can occur during salience operations
#[derive(Error, Debug)]
pub enum SalienceError {
    // Usage errors (exit code 2)
    #[error("unknown format: {0} (expected: human or json)")]
    UnknownFormat(String),

    #[error("{0}")]
    UsageError(String),

    #[error("invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    // Data/store errors (exit code 3)
    #[error("store not found at {path:?} (run `salience init` first)")]
    StoreNotFound { path: PathBuf },

    #[error("note not found: {key}")]
    NoteNotFound { key: String },

    #[error("invalid record in {path:?} line {line}: {reason}")]
    InvalidRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    // Generic failures (exit code 1)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("summarizer failed: {0}")]
    Summarizer(String),

    #[error("summarizer timed out after {seconds}s")]
    SummarizerTimeout { seconds: u64 },

    #[error("failed to {operation}: {reason}")]
    FailedOperation { operation: String, reason: String },

    #[error("failed to {operation} {target}: {reason}")]
    FailedOperationWithTarget {
        operation: String,
        target: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

impl SalienceError {
    /// Create an error for a failed IO operation with context
    pub fn io_operation(
        operation: &str,
        path: impl std::fmt::Display,
        error: impl std::fmt::Display,
    ) -> Self {
        SalienceError::FailedOperationWithTarget {
            operation: operation.to_string(),
            target: path.to_string(),
            reason: error.to_string(),
        }
    }

    /// Create an error for a failed operation without a specific target
    pub fn failed(operation: &str, error: impl std::fmt::Display) -> Self {
        SalienceError::FailedOperation {
            operation: operation.to_string(),
            reason: error.to_string(),
        }
    }

    /// Create an error for an out-of-range configuration constant
    pub fn invalid_config(field: &str, reason: impl std::fmt::Display) -> Self {
        SalienceError::InvalidConfig {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            SalienceError::UnknownFormat(_)
            | SalienceError::UsageError(_)
            | SalienceError::InvalidConfig { .. } => ExitCode::Usage,

            SalienceError::StoreNotFound { .. }
            | SalienceError::NoteNotFound { .. }
            | SalienceError::InvalidRecord { .. } => ExitCode::Data,

            SalienceError::Io(_)
            | SalienceError::Json(_)
            | SalienceError::Toml(_)
            | SalienceError::Summarizer(_)
            | SalienceError::SummarizerTimeout { .. }
            | SalienceError::FailedOperation { .. }
            | SalienceError::FailedOperationWithTarget { .. }
            | SalienceError::Other(_) => ExitCode::Failure,
        }
    }

    /// Get the error type identifier
    fn error_type(&self) -> &'static str {
        match self {
            SalienceError::UnknownFormat(_) => "unknown_format",
            SalienceError::UsageError(_) => "usage_error",
            SalienceError::InvalidConfig { .. } => "invalid_config",
            SalienceError::StoreNotFound { .. } => "store_not_found",
            SalienceError::NoteNotFound { .. } => "note_not_found",
            SalienceError::InvalidRecord { .. } => "invalid_record",
            SalienceError::Io(_) => "io_error",
            SalienceError::Json(_) => "json_error",
            SalienceError::Toml(_) => "toml_error",
            SalienceError::Summarizer(_) => "summarizer_error",
            SalienceError::SummarizerTimeout { .. } => "summarizer_timeout",
            SalienceError::FailedOperation { .. } => "failed_operation",
            SalienceError::FailedOperationWithTarget { .. } => "failed_operation_with_target",
            SalienceError::Other(_) => "other",
        }
    }

    /// Convert error to JSON representation for structured error output.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.exit_code() as i32,
                "type": self.error_type(),
                "message": self.to_string(),
            }
        })
    }
}

/// Result type alias for salience operations
pub type Result<T> = std::result::Result<T, SalienceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_class() {
        assert_eq!(
            SalienceError::UsageError("bad".into()).exit_code(),
            ExitCode::Usage
        );
        assert_eq!(
            SalienceError::invalid_config("decay.factor", "must be in (0, 1)").exit_code(),
            ExitCode::Usage
        );
        assert_eq!(
            SalienceError::StoreNotFound {
                path: PathBuf::from("/nope")
            }
            .exit_code(),
            ExitCode::Data
        );
        assert_eq!(
            SalienceError::SummarizerTimeout { seconds: 5 }.exit_code(),
            ExitCode::Failure
        );
    }

    #[test]
    fn test_to_json_envelope() {
        let err = SalienceError::NoteNotFound {
            key: "abc123".to_string(),
        };
        let json = err.to_json();
        assert_eq!(json["error"]["code"], 3);
        assert_eq!(json["error"]["type"], "note_not_found");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("abc123"));
    }
}
